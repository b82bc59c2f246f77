//! Daily tabular log.
//!
//! One CSV file per calendar day, grown by a full read-modify-write each poll.
//! The file is anchored once a day at a fixed wall-clock time, from whatever
//! the local mirror holds when the anchor comes due. Shortly after midnight
//! that can still be the previous day's file.

use super::{Lifecycle, Polling, fetch_values, resolve_channels};
use crate::anchor::anchor_logged;
use crate::context::{Context, PodLayout};
use crate::error::Result;
use crate::naming::daily_file_name;
use crate::schedule::Scheduler;
use async_trait::async_trait;
use podanchor_sensor::format::{tabular_header, tabular_row};
use podanchor_sensor::{Channels, SensorHandle};
use podanchor_storage::{ContentType, encode_name};
use std::path::PathBuf;
use time::Time;

#[derive(Debug)]
struct AnchorMirror;

pub struct AppendStrategy {
    ctx: Context,
    sensor: SensorHandle,
    layout: PodLayout,
    polling: Polling,
    anchor_time: Time,
    scheduler: Scheduler<AnchorMirror>,
    armed: bool,
    channels: Option<Channels>,
    mirror_path: Option<PathBuf>,
}

impl AppendStrategy {
    pub fn new(ctx: Context, sensor: SensorHandle, layout: PodLayout, polling: Polling, anchor_time: Time) -> Self {
        Self {
            ctx,
            sensor,
            layout,
            polling,
            anchor_time,
            scheduler: Scheduler::new(),
            armed: false,
            channels: None,
            mirror_path: None,
        }
    }

    /// Whether the daily anchor is currently armed.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    async fn run_pending(&mut self) {
        for _ in self.scheduler.run_pending(self.ctx.clock.now()) {
            // Re-arm on the next cycle, for the next day.
            self.armed = false;
            match &self.mirror_path {
                Some(path) => {
                    anchor_logged(self.ctx.ledger.as_ref(), path).await;
                },
                None => tracing::warn!("Anchor came due with no local mirror; nothing to anchor today"),
            }
        }
    }
}

#[async_trait]
impl Lifecycle for AppendStrategy {
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
        let name = daily_file_name(self.ctx.clock.now().date());
        let path = self.layout.file(&encode_name(&name));

        let header = tabular_header(&channels);
        self.ctx.create_file_if_absent(&path, header.as_bytes(), ContentType::Csv).await?;
        let mut content = self.ctx.read(&path).await?;

        let values = fetch_values(&self.ctx, &self.sensor, &channels).await?;
        let row = tabular_row(self.ctx.clock.now(), &values);
        content.push(b'\n');
        content.extend_from_slice(row.as_bytes());
        self.ctx.write(&path, &content, ContentType::Csv).await?;
        tracing::info!(path = %path.display(), %row, "Appended reading");

        let confirmed = self.ctx.read(&path).await?;
        if confirmed != content {
            tracing::warn!(path = %path.display(), "Pod content differs from what was written; mirroring the pod's copy");
        }
        self.mirror_path = Some(self.ctx.mirror.write(&name, &confirmed).await?);

        if !self.armed {
            let due = self.scheduler.once_at(self.anchor_time, self.ctx.clock.now(), AnchorMirror);
            self.armed = true;
            tracing::info!(%due, "Daily anchor armed");
        }
        Ok(path)
    }

    async fn wait(&mut self) -> Result<()> {
        let mut waited = std::time::Duration::ZERO;
        while waited < self.polling.interval {
            self.run_pending().await;
            let step = self.polling.tick.min(self.polling.interval - waited);
            self.ctx.clock.sleep(step).await;
            waited += step;
        }
        self.run_pending().await;
        if let Some(path) = self.mirror_path.take()
            && let Err(err) = self.ctx.mirror.remove(&path).await
        {
            tracing::warn!(path = %path.display(), error = ?err, "Unable to remove local mirror");
        }
        Ok(())
    }
}
