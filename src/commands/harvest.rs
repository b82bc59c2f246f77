use super::{backend, context, load_config, open_ledger, sensor};
use crate::error::{ErrorKind, Result};
use clap::{Args, ValueEnum};
use exn::ResultExt;
use podanchor_config::Strategy;
use podanchor_harvest::PodLayout;
use podanchor_harvest::strategy::{AppendStrategy, Lifecycle, Polling, SnapshotStrategy, run as run_strategy};
use std::path::Path;
use std::process::ExitCode;

#[derive(Args, Debug)]
pub struct HarvestArgs {
    /// Override the configured file lifecycle
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum StrategyArg {
    /// One tabular file per day, anchored daily
    Append,
    /// One graph document per reading, anchored immediately
    Snapshot,
}

impl From<StrategyArg> for Strategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Append => Self::Append,
            StrategyArg::Snapshot => Self::Snapshot,
        }
    }
}

pub async fn run(config_path: Option<&Path>, args: HarvestArgs) -> Result<ExitCode> {
    let mut config = load_config(config_path)?;
    if let Some(strategy) = args.strategy {
        config.harvest.strategy = strategy.into();
    }
    let anchor_time = config.harvest.anchor_time().or_raise(|| ErrorKind::Config)?;
    let polling = Polling {
        interval: config.harvest.polling_interval(),
        tick: config.harvest.tick(),
    };

    let sensor = sensor(&config)?;
    let ctx = context(&config, backend(&config)?, open_ledger(&config).await?);
    let mut strategy: Box<dyn Lifecycle> = match config.harvest.strategy {
        Strategy::Append => {
            let layout = PodLayout::new(&config.pod.tabular_collection, &config.pod.device);
            Box::new(AppendStrategy::new(ctx, sensor, layout, polling, anchor_time))
        },
        Strategy::Snapshot => {
            let layout = PodLayout::new(&config.pod.graph_collection, &config.pod.device);
            Box::new(SnapshotStrategy::new(ctx, sensor, layout, polling))
        },
    };

    tracing::info!(
        strategy = ?config.harvest.strategy,
        polling_secs = config.harvest.polling_secs,
        device = %config.pod.device,
        "Starting harvest"
    );
    run_strategy(strategy.as_mut()).await.or_raise(|| ErrorKind::Harvest)?;
    Ok(ExitCode::SUCCESS)
}
