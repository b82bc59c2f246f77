//! Configuration loading and validation.
//!
//! Settings are layered, later layers overriding earlier ones:
//!
//! 1. Built-in defaults ([`Config::default`]): a local directory pod fed by
//!    the simulated monitor, so a fresh install can harvest immediately.
//! 2. A configuration file, TOML unless the extension says YAML or JSON.
//!    Defaults to `podanchor.toml` in the platform configuration directory.
//! 3. Environment variables prefixed `PODANCHOR_`, with `__` separating
//!    nested keys (`PODANCHOR_HARVEST__POLLING_SECS=60`).

pub mod error;
mod model;

pub use crate::model::{HarvestConfig, LedgerConfig, PodBackend, PodConfig, SensorConfig, Strategy};
use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "PODANCHOR_";
pub const CONFIG_FILENAME: &str = "podanchor.toml";

/// Commented configuration written by `podanchor init`.
pub const TEMPLATE: &str = r#"# podanchor configuration
#
# Any value can be overridden from the environment, using __ between nested
# keys: PODANCHOR_HARVEST__POLLING_SECS=60, PODANCHOR_POD__BACKEND__TOKEN=...

[pod]
tabular_collection = "csv-aqm-data"
graph_collection = "ttl-aqm-data"
device = "aqm1"

[pod.backend]
kind = "http"
endpoint = "https://username.solidcommunity.net/"
# token = "bearer token issued by the pod provider"
timeout_secs = 30

[sensor]
kind = "http"
url = "http://127.0.0.1"
port = 8080
timeout_secs = 30
# Without a device, use the built-in monitor instead:
# kind = "simulated"
# latitude = 51.37981428316116
# longitude = -2.328047487717645

[ledger]
# path = "/var/lib/podanchor/ledger.jsonl"

[harvest]
# "append" (daily tabular file) or "snapshot" (one graph document per reading)
strategy = "append"
polling_secs = 900
retry_secs = 30
# max_attempts = 10
anchor_time = "23:59:59"
tick_ms = 1000
"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub pod: PodConfig,
    pub sensor: SensorConfig,
    pub ledger: LedgerConfig,
    pub harvest: HarvestConfig,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("net", "podanchor", "podanchor")
}

impl Default for Config {
    fn default() -> Self {
        let dirs = project_dirs();
        let data_dir = dirs.as_ref().map_or_else(|| PathBuf::from("/var/lib/podanchor"), |d| d.data_dir().to_path_buf());
        let cache_dir = dirs.as_ref().map_or_else(|| std::env::temp_dir().join("podanchor"), |d| d.cache_dir().to_path_buf());
        Self {
            pod: PodConfig {
                backend: PodBackend::Local {
                    root: data_dir.join("pod"),
                },
                tabular_collection: "csv-aqm-data".to_string(),
                graph_collection: "ttl-aqm-data".to_string(),
                device: "aqm1".to_string(),
            },
            sensor: SensorConfig::Simulated {
                latitude: 51.37981428316116,
                longitude: -2.328047487717645,
                seed: None,
            },
            ledger: LedgerConfig {
                path: data_dir.join("ledger.jsonl"),
            },
            harvest: HarvestConfig {
                strategy: Strategy::Append,
                polling_secs: 900,
                retry_secs: 30,
                max_attempts: None,
                anchor_time: "23:59:59".to_string(),
                mirror_dir: cache_dir.join("mirror"),
                tick_ms: 1000,
            },
        }
    }
}

impl Config {
    /// Platform default location of the configuration file.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
    }

    /// The merged providers, before extraction.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            figment = match file.extension().and_then(|ext| ext.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
                Some("json") => figment.merge(Json::file(file)),
                _ => figment.merge(Toml::file(file)),
            };
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate configuration.
    ///
    /// An explicit `file` must exist. Without one, the platform default file is
    /// used when present.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = match file {
            Some(file) if !file.exists() => exn::bail!(ErrorKind::NotFound(file.to_path_buf())),
            Some(file) => Some(file.to_path_buf()),
            None => Self::default_path().filter(|path| path.exists()),
        };
        match &file {
            Some(file) => tracing::debug!(path = %file.display(), "Loading configuration file"),
            None => tracing::debug!("No configuration file; using defaults and environment"),
        }
        let config: Config = Self::figment(file.as_deref()).extract().map_err(|e| ErrorKind::Load(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.pod.validate()?;
        self.sensor.validate()?;
        self.harvest.validate()
    }

    /// Write [`TEMPLATE`] to `path` with owner-only permissions.
    ///
    /// Returns `false` without touching anything if the file already exists.
    pub fn write_template(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(ErrorKind::Io)?;
        }
        std::fs::write(path, TEMPLATE).map_err(ErrorKind::Io)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(ErrorKind::Io)?;
        }
        Ok(true)
    }
}
