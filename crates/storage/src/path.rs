//! Path validation for pod-relative resource paths.
//!
//! Every backend receives paths relative to the pod root. They are normalized
//! here and rejected if they would escape the root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a pod-relative path and returns its normalized form.
///
/// > **Note:** Names are expected to be URL-escaped already (see
/// >           [`encode_name`](crate::encode_name)); this does not escape
/// >           anything. Null bytes are explicitly rejected.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use podanchor_storage::validate_path;
/// assert!(validate_path("csv-aqm-data/aqm1/2022-03-21.csv").is_ok());
/// assert!(validate_path("ttl-aqm-data/aqm1/2022-03-21%2011%3A19%3A47.ttl").is_ok());
/// assert!(validate_path("../other-pod/secret.csv").is_err());
/// assert!(validate_path("a\0b").is_err());
/// assert_eq!(
///     validate_path("csv-aqm-data//./aqm1/").unwrap(),
///     Path::new("csv-aqm-data/aqm1")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}
