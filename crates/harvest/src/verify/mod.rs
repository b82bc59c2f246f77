//! Re-checking stored files against the ledger.
//!
//! Each selected file is fetched from the pod, mirrored locally, hashed from
//! disk and looked up in the ledger. A file is valid exactly when some anchor
//! recorded its current bytes.

mod filter;

pub use self::filter::{FileFormat, Mode, Query, Selection, UsageError};
use crate::context::{Context, PodLayout};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use podanchor_ledger::Digest;
use podanchor_storage::decode_name;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    /// Decoded file name
    pub file_name: String,
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Report {
    /// One row per selected file, in name order
    pub rows: Vec<VerificationResult>,
    /// Set only when nothing was selected
    pub summary: Option<String>,
}

pub struct Verifier {
    ctx: Context,
    layout: PodLayout,
}

impl Verifier {
    pub fn new(ctx: Context, layout: PodLayout) -> Self {
        Self { ctx, layout }
    }

    #[tracing::instrument(skip_all, fields(folder = %self.layout.device_folder().display()))]
    pub async fn verify(&self, selection: &Selection) -> Result<Report> {
        let folder = self.layout.device_folder();
        let mut names: Vec<String> =
            self.ctx.list(&folder).await?.into_iter().filter(|item| !item.is_folder).map(|item| item.name).collect();
        names.sort();
        tracing::debug!(files = names.len(), "Listed device folder");

        let mut report = Report::default();
        for name in names.iter().filter(|name| selection.matches(name)) {
            let valid = self.verify_file(name).await?;
            report.rows.push(VerificationResult {
                file_name: decode_name(name),
                valid,
            });
        }
        if report.rows.is_empty() {
            report.summary = Some(selection.empty_summary());
        }
        Ok(report)
    }

    async fn verify_file(&self, remote_name: &str) -> Result<bool> {
        let Some(local_name) = self.local_name(remote_name) else {
            tracing::warn!(file = remote_name, "File name cannot be mirrored locally, reporting it invalid");
            return Ok(false);
        };
        let bytes = self.ctx.read(&self.layout.file(remote_name)).await?;
        let local = self.ctx.mirror.write(&local_name, &bytes).await?;
        let digest = Digest::of_file(&local).await.or_raise(|| ErrorKind::Ledger);
        if let Err(err) = self.ctx.mirror.remove(&local).await {
            tracing::warn!(path = %local.display(), error = ?err, "Unable to remove local copy");
        }
        let digest = digest?;
        let valid = self.ctx.ledger.contains(&digest).await.or_raise(|| ErrorKind::Ledger)?;
        tracing::info!(file = remote_name, %digest, valid, "Verified file");
        Ok(valid)
    }

    /// Mirror name for a listed file: decoded when that is a plain file name,
    /// otherwise the name exactly as the pod escaped it.
    fn local_name(&self, remote_name: &str) -> Option<String> {
        [decode_name(remote_name), remote_name.to_string()]
            .into_iter()
            .find(|name| self.ctx.mirror.path_of(name).is_ok())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAME: &str = "File Name";
        const VALID: &str = "Valid Hash";
        let name_width = self.rows.iter().map(|row| row.file_name.chars().count()).chain([NAME.len()]).max().unwrap_or(0);
        let valid_width = VALID.len();
        let border = format!("+-{}-+-{}-+", "-".repeat(name_width), "-".repeat(valid_width));
        writeln!(f, "{border}")?;
        writeln!(f, "| {NAME:<name_width$} | {VALID:<valid_width$} |")?;
        writeln!(f, "{border}")?;
        for row in &self.rows {
            writeln!(f, "| {:<name_width$} | {:<valid_width$} |", row.file_name, row.valid)?;
        }
        if !self.rows.is_empty() {
            writeln!(f, "{border}")?;
        }
        Ok(())
    }
}
