//! Subcommands, and wiring configuration into the library types they drive.

pub mod harvest;
pub mod init;
pub mod ledger;
pub mod verify;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use podanchor_config::{Config, PodBackend, SensorConfig};
use podanchor_harvest::Context;
use podanchor_harvest::clock::SystemClock;
use podanchor_harvest::mirror::LocalMirror;
use podanchor_harvest::retry::RetryPolicy;
use podanchor_ledger::{FileLedger, LedgerHandle};
use podanchor_sensor::{HttpSensor, SensorHandle, SimulatedSensor};
use podanchor_storage::BackendHandle;
use podanchor_storage::backend::{HttpBackend, LocalBackend};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub(crate) fn load_config(file: Option<&Path>) -> Result<Config> {
    Config::load(file).or_raise(|| ErrorKind::Config)
}

pub(crate) fn backend(config: &Config) -> Result<BackendHandle> {
    let backend: BackendHandle = match &config.pod.backend {
        PodBackend::Http {
            endpoint,
            token,
            timeout_secs,
        } => Arc::new(
            HttpBackend::new("pod", endpoint.as_str(), token.clone(), Duration::from_secs(*timeout_secs))
                .or_raise(|| ErrorKind::Storage)?,
        ),
        PodBackend::Local { root } => Arc::new(LocalBackend::new("local", root).or_raise(|| ErrorKind::Storage)?),
    };
    tracing::debug!(backend = backend.name(), "Pod backend ready");
    Ok(backend)
}

pub(crate) fn sensor(config: &Config) -> Result<SensorHandle> {
    let sensor: SensorHandle = match &config.sensor {
        SensorConfig::Http {
            url,
            port,
            timeout_secs,
        } => Arc::new(HttpSensor::new(url, *port, Duration::from_secs(*timeout_secs)).or_raise(|| ErrorKind::Sensor)?),
        SensorConfig::Simulated {
            latitude,
            longitude,
            seed: Some(seed),
        } => Arc::new(SimulatedSensor::seeded(*latitude, *longitude, *seed)),
        SensorConfig::Simulated { latitude, longitude, .. } => Arc::new(SimulatedSensor::new(*latitude, *longitude)),
    };
    Ok(sensor)
}

pub(crate) async fn open_ledger(config: &Config) -> Result<Arc<FileLedger>> {
    let ledger = FileLedger::open(&config.ledger.path).await.or_raise(|| ErrorKind::Ledger)?;
    Ok(Arc::new(ledger))
}

pub(crate) fn context(config: &Config, backend: BackendHandle, ledger: LedgerHandle) -> Context {
    Context {
        backend,
        ledger,
        mirror: LocalMirror::new(&config.harvest.mirror_dir),
        clock: Arc::new(SystemClock::new()),
        retry: RetryPolicy {
            delay: config.harvest.retry_delay(),
            max_attempts: config.harvest.max_attempts,
        },
    }
}
