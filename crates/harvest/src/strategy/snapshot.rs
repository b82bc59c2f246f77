//! One graph document per observation.
//!
//! Every cycle writes a new, self-contained Turtle file named after the exact
//! time of the reading, and anchors it as soon as the pod has it.

use super::{Lifecycle, Polling, fetch_values, resolve_channels};
use crate::anchor::anchor_logged;
use crate::context::{Context, PodLayout};
use crate::document::observation;
use crate::error::Result;
use crate::naming::snapshot_file_name;
use async_trait::async_trait;
use podanchor_sensor::{Channels, SensorHandle};
use podanchor_storage::{ContentType, encode_name};
use std::path::PathBuf;

pub struct SnapshotStrategy {
    ctx: Context,
    sensor: SensorHandle,
    layout: PodLayout,
    polling: Polling,
    channels: Option<Channels>,
}

impl SnapshotStrategy {
    pub fn new(ctx: Context, sensor: SensorHandle, layout: PodLayout, polling: Polling) -> Self {
        Self {
            ctx,
            sensor,
            layout,
            polling,
            channels: None,
        }
    }
}

#[async_trait]
impl Lifecycle for SnapshotStrategy {
    async fn start(&mut self) -> Result<()> {
        self.ctx.ensure_layout(&self.layout).await?;
        self.channels = Some(resolve_channels(&self.ctx, &self.sensor).await?);
        Ok(())
    }

    async fn cycle(&mut self) -> Result<PathBuf> {
        let channels = match &self.channels {
            Some(channels) => channels.clone(),
            None => resolve_channels(&self.ctx, &self.sensor).await?,
        };
        let now = self.ctx.clock.now();
        let name = snapshot_file_name(now);
        let path = self.layout.file(&encode_name(&name));

        let values = fetch_values(&self.ctx, &self.sensor, &channels).await?;
        let document = observation(now, &channels, &values);
        self.ctx.write(&path, document.as_bytes(), ContentType::Turtle).await?;
        tracing::info!(path = %path.display(), "Added observation");

        let confirmed = self.ctx.read(&path).await?;
        let mirror_path = self.ctx.mirror.write(&name, &confirmed).await?;
        anchor_logged(self.ctx.ledger.as_ref(), &mirror_path).await;
        self.ctx.mirror.remove(&mirror_path).await?;
        Ok(path)
    }

    async fn wait(&mut self) -> Result<()> {
        self.ctx.clock.sleep(self.polling.interval).await;
        Ok(())
    }
}
