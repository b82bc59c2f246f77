//! Configuration sections.

use crate::error::{ErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use time::Time;
use time::macros::format_description;

/// Where the pod lives and how it is laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodConfig {
    pub backend: PodBackend,
    /// Top-level folder holding one daily tabular file per device
    pub tabular_collection: String,
    /// Top-level folder holding one graph document per observation
    pub graph_collection: String,
    /// Folder name of this device inside each collection
    pub device: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PodBackend {
    /// Solid-style pod server
    Http {
        endpoint: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    /// Directory standing in for a pod
    Local { root: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SensorConfig {
    /// Device exposing `{url}:{port}/properties`
    Http {
        url: String,
        port: u16,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    /// Built-in random air-quality monitor
    Simulated {
        latitude: f64,
        longitude: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<u64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One tabular file per day, anchored once a day
    #[default]
    Append,
    /// One graph document per observation, each anchored immediately
    Snapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestConfig {
    pub strategy: Strategy,
    pub polling_secs: u64,
    pub retry_secs: u64,
    /// Give up after this many attempts of one operation; retry forever when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    /// Local wall-clock time of the daily anchor, `HH:MM:SS`
    pub anchor_time: String,
    pub mirror_dir: PathBuf,
    /// Granularity of the wait loop between polls
    pub tick_ms: u64,
}

pub(crate) fn default_timeout_secs() -> u64 {
    30
}

impl PodBackend {
    fn validate(&self) -> Result<()> {
        match self {
            Self::Http {
                endpoint, timeout_secs, ..
            } => {
                if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                    exn::bail!(ErrorKind::invalid("pod.backend.endpoint", format!("{endpoint} is not an HTTP(S) URL")));
                }
                if *timeout_secs == 0 {
                    exn::bail!(ErrorKind::invalid("pod.backend.timeout_secs", "must be greater than zero"));
                }
            },
            Self::Local { root } => {
                if !root.is_absolute() {
                    exn::bail!(ErrorKind::invalid("pod.backend.root", format!("{} is not absolute", root.display())));
                }
            },
        }
        Ok(())
    }
}

fn validate_segment(key: &'static str, value: &str) -> Result<()> {
    if value.is_empty() || value.contains(['/', '\\']) || value == "." || value == ".." {
        exn::bail!(ErrorKind::invalid(key, format!("{value:?} is not a single folder name")));
    }
    Ok(())
}

impl PodConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        self.backend.validate()?;
        validate_segment("pod.tabular_collection", &self.tabular_collection)?;
        validate_segment("pod.graph_collection", &self.graph_collection)?;
        validate_segment("pod.device", &self.device)
    }
}

impl SensorConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Self::Http { url, timeout_secs, .. } => {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    exn::bail!(ErrorKind::invalid("sensor.url", format!("{url} is not an HTTP(S) URL")));
                }
                if *timeout_secs == 0 {
                    exn::bail!(ErrorKind::invalid("sensor.timeout_secs", "must be greater than zero"));
                }
            },
            Self::Simulated { latitude, longitude, .. } => {
                if !(-90.0..=90.0).contains(latitude) {
                    exn::bail!(ErrorKind::invalid("sensor.latitude", format!("{latitude} is out of range")));
                }
                if !(-180.0..=180.0).contains(longitude) {
                    exn::bail!(ErrorKind::invalid("sensor.longitude", format!("{longitude} is out of range")));
                }
            },
        }
        Ok(())
    }
}

impl HarvestConfig {
    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// The daily anchor time, parsed.
    pub fn anchor_time(&self) -> Result<Time> {
        Ok(Time::parse(&self.anchor_time, format_description!("[hour]:[minute]:[second]")).map_err(|_| {
            ErrorKind::invalid("harvest.anchor_time", format!("{:?} is not in the format HH:MM:SS", self.anchor_time))
        })?)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("harvest.polling_secs", self.polling_secs),
            ("harvest.retry_secs", self.retry_secs),
            ("harvest.tick_ms", self.tick_ms),
        ] {
            if value == 0 {
                exn::bail!(ErrorKind::invalid(key, "must be greater than zero"));
            }
        }
        if self.max_attempts == Some(0) {
            exn::bail!(ErrorKind::invalid("harvest.max_attempts", "must be greater than zero when set"));
        }
        self.anchor_time().map(|_| ())
    }
}
