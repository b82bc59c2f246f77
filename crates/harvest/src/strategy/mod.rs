//! File lifecycle strategies.
//!
//! Both strategies share one contract ([`Lifecycle`]): prepare the pod once,
//! then alternate poll cycles with waits, forever. A failed cycle is logged
//! and skipped; only an exhausted retry budget stops the loop.

mod append;
mod snapshot;

pub use self::append::AppendStrategy;
pub use self::snapshot::SnapshotStrategy;
use crate::context::Context;
use crate::error::{ErrorKind, Result};
use crate::retry::retry;
use async_trait::async_trait;
use exn::ResultExt;
use podanchor_sensor::{Channels, PropertySet, SensorHandle};
use serde_json::Number;
use std::path::PathBuf;
use std::time::Duration;

/// How often to poll, and how finely to check for due jobs while waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Polling {
    pub interval: Duration,
    pub tick: Duration,
}

#[async_trait]
pub trait Lifecycle: Send {
    /// Ensure the pod folders exist and fix the channel list.
    async fn start(&mut self) -> Result<()>;

    /// One poll cycle. Returns the pod path that was written.
    async fn cycle(&mut self) -> Result<PathBuf>;

    /// Wait until the next cycle is due.
    async fn wait(&mut self) -> Result<()>;
}

/// Run a strategy until it fails fatally.
pub async fn run(strategy: &mut dyn Lifecycle) -> Result<()> {
    strategy.start().await?;
    loop {
        match strategy.cycle().await {
            Ok(path) => tracing::debug!(path = %path.display(), "Cycle complete"),
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => tracing::error!(error = ?err, "Skipping cycle"),
        }
        strategy.wait().await?;
    }
}

async fn fetch(ctx: &Context, sensor: &SensorHandle) -> Result<PropertySet> {
    let sensor = sensor.as_ref();
    retry(&ctx.retry, ctx.clock(), "get data from sensor", move || sensor.fetch()).await
}

/// Fetch once to learn the channels a run will report.
async fn resolve_channels(ctx: &Context, sensor: &SensorHandle) -> Result<Channels> {
    let channels = Channels::resolve(&fetch(ctx, sensor).await?);
    tracing::info!(sensor = sensor.name(), %channels, "Resolved sensor channels");
    Ok(channels)
}

/// Fetch a fresh reading, in header order.
async fn fetch_values(ctx: &Context, sensor: &SensorHandle, channels: &Channels) -> Result<Vec<Number>> {
    let properties = fetch(ctx, sensor).await?;
    channels.align(&properties).or_raise(|| ErrorKind::Sensor)
}
