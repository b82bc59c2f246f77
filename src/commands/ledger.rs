use super::{load_config, open_ledger};
use crate::error::{ErrorKind, Result};
use clap::Subcommand;
use exn::ResultExt;
use podanchor_ledger::{Digest, Ledger};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Subcommand, Debug)]
pub enum LedgerCommands {
    /// Show how many digests are anchored, and the latest one
    Status,

    /// Check whether a local file's current contents were ever anchored
    Check {
        /// File to hash
        file: PathBuf,
    },
}

pub async fn run(config_path: Option<&Path>, command: LedgerCommands) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let ledger = open_ledger(&config).await?;
    match command {
        LedgerCommands::Status => {
            let count = ledger.count().await.or_raise(|| ErrorKind::Ledger)?;
            println!("Ledger: {}", ledger.path().display());
            println!("Anchored digests: {count}");
            match ledger.latest().await.or_raise(|| ErrorKind::Ledger)? {
                Some(digest) => println!("Latest: {digest}"),
                None => println!("Latest: none"),
            }
            Ok(ExitCode::SUCCESS)
        },
        LedgerCommands::Check { file } => {
            let digest = Digest::of_file(&file).await.or_raise(|| ErrorKind::Ledger)?;
            let anchored = ledger.contains(&digest).await.or_raise(|| ErrorKind::Ledger)?;
            println!("{} {digest} {}", file.display(), if anchored { "anchored" } else { "not anchored" });
            Ok(if anchored { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        },
    }
}
