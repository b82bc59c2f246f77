//! Storage models.
//!
//! These types describe items as a pod reports them in folder listings, and
//! the content types files are declared with when written.

use std::fmt;
use std::path::PathBuf;

/// Declared content type of a file written to a pod.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// Comma separated tabular text (`text/csv`)
    Csv,
    /// RDF graph serialized as Turtle (`text/turtle`)
    Turtle,
}
impl ContentType {
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Turtle => "text/turtle",
        }
    }
}
impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// An immediate child of a pod folder, as returned by listing operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemInfo {
    /// Relative path from storage root
    pub path: PathBuf,
    /// Resource name exactly as the pod stores it (still URL-escaped)
    pub name: String,
    /// Whether the child is itself a folder (container)
    pub is_folder: bool,
}
impl ItemInfo {
    pub fn file(folder: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: folder.into().join(&name),
            name,
            is_folder: false,
        }
    }

    pub fn folder(folder: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            is_folder: true,
            ..Self::file(folder, name)
        }
    }
}
