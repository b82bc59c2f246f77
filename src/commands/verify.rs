use super::{backend, context, load_config, open_ledger};
use crate::error::{ErrorKind, Result};
use clap::{Args, ValueEnum};
use exn::ResultExt;
use podanchor_harvest::PodLayout;
use podanchor_harvest::verify::{FileFormat, Mode, Query, Selection, Verifier};
use podanchor_storage::backend::ReadOnlyBackend;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Verify one file, or every file of the device
    #[arg(long, value_enum)]
    mode: ModeArg,

    /// Which collection to verify
    #[arg(long, value_enum, default_value = "ttl")]
    format: FormatArg,

    /// Date of the file to verify (YYYY-MM-DD), single mode only
    #[arg(long)]
    date: Option<String>,

    /// Time of the file to verify (HH:MM:SS), single mode with ttl only
    #[arg(long)]
    time: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ModeArg {
    Single,
    All,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FormatArg {
    Csv,
    Ttl,
}

impl VerifyArgs {
    fn query(self) -> Query {
        Query {
            mode: match self.mode {
                ModeArg::Single => Mode::Single,
                ModeArg::All => Mode::All,
            },
            format: match self.format {
                FormatArg::Csv => FileFormat::Csv,
                FormatArg::Ttl => FileFormat::Ttl,
            },
            date: self.date,
            time: self.time,
        }
    }
}

/// Exit status for an incomplete or malformed selection.
const USAGE_ERROR: u8 = 1;

fn selection(args: VerifyArgs) -> std::result::Result<Selection, u8> {
    args.query().validate().map_err(|usage| {
        println!("{usage}");
        USAGE_ERROR
    })
}

pub async fn run(config_path: Option<&Path>, args: VerifyArgs) -> Result<ExitCode> {
    let selection = match selection(args) {
        Ok(selection) => selection,
        Err(status) => return Ok(ExitCode::from(status)),
    };

    let config = load_config(config_path)?;
    let backend = Arc::new(ReadOnlyBackend::new(backend(&config)?));
    let ctx = context(&config, backend, open_ledger(&config).await?);
    let collection = match selection.format() {
        FileFormat::Csv => &config.pod.tabular_collection,
        FileFormat::Ttl => &config.pod.graph_collection,
    };
    let verifier = Verifier::new(ctx, PodLayout::new(collection, &config.pod.device));

    let report = verifier.verify(&selection).await.or_raise(|| ErrorKind::Verify)?;
    if let Some(summary) = &report.summary {
        println!("{summary}");
    }
    print!("{report}");
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use podanchor_harvest::verify::UsageError;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: VerifyArgs,
    }

    fn args(argv: &[&str]) -> VerifyArgs {
        Harness::parse_from(std::iter::once("verify").chain(argv.iter().copied())).args
    }

    fn parse(argv: &[&str]) -> Query {
        args(argv).query()
    }

    #[test]
    fn test_format_defaults_to_graph_files() {
        let query = parse(&["--mode", "all"]);
        assert_eq!(query.mode, Mode::All);
        assert_eq!(query.format, FileFormat::Ttl);
    }

    #[test]
    fn test_single_requires_time_for_graph_files() {
        let query = parse(&["--mode", "single", "--date", "2022-03-21"]);
        assert_eq!(query.validate(), Err(UsageError::MissingTime));
    }

    #[test]
    fn test_csv_single() {
        let query = parse(&["--mode", "single", "--format", "csv", "--date", "2022-03-21"]);
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_mode_is_required() {
        assert!(Harness::try_parse_from(["verify", "--format", "csv"]).is_err());
    }

    #[test]
    fn test_usage_error_exits_with_status_one() {
        assert_eq!(selection(args(&["--mode", "single"])).err(), Some(1));
        assert_eq!(selection(args(&["--mode", "single", "--date", "21/03/2022", "--time", "11:19:47"])).err(), Some(1));
        assert!(selection(args(&["--mode", "all"])).is_ok());
    }

    #[tokio::test]
    async fn test_usage_error_is_reported_before_config_is_loaded() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("missing/podanchor.toml");
        let status = run(Some(&config_path), args(&["--mode", "single"])).await;
        assert!(status.is_ok());
    }
}
