#![allow(dead_code)]

use async_trait::async_trait;
use podanchor_harvest::clock::ManualClock;
use podanchor_harvest::mirror::LocalMirror;
use podanchor_harvest::retry::RetryPolicy;
use podanchor_harvest::strategy::Polling;
use podanchor_harvest::{Context, PodLayout};
use podanchor_ledger::MemoryLedger;
use podanchor_sensor::error::{ErrorKind as SensorErrorKind, Result as SensorResult};
use podanchor_sensor::{PropertySet, Sensor};
use podanchor_storage::backend::MockBackend;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use time::PrimitiveDateTime;

/// Sensor answering from a script; the last answer repeats forever.
pub struct ScriptedSensor {
    script: Mutex<VecDeque<PropertySet>>,
    last: Mutex<Option<PropertySet>>,
    failures: AtomicUsize,
    fetches: AtomicUsize,
}

impl ScriptedSensor {
    pub fn new(script: &[&str]) -> Self {
        let script = script.iter().map(|json| PropertySet::from_json(json.as_bytes()).unwrap()).collect();
        Self {
            script: Mutex::new(script),
            last: Mutex::new(None),
            failures: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn constant(json: &str) -> Self {
        Self::new(&[json])
    }

    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sensor for ScriptedSensor {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self) -> SensorResult<PropertySet> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok() {
            exn::bail!(SensorErrorKind::Unreachable("scripted outage".to_string()));
        }
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            *last = Some(next);
        }
        Ok(last.clone().unwrap())
    }
}

pub struct Harness {
    pub backend: Arc<MockBackend>,
    pub ledger: Arc<MemoryLedger>,
    pub clock: Arc<ManualClock>,
    pub mirror_dir: tempfile::TempDir,
    pub retry: RetryPolicy,
}

impl Harness {
    pub fn new(start: PrimitiveDateTime) -> Self {
        Self::with_backend(start, MockBackend::default())
    }

    pub fn with_backend(start: PrimitiveDateTime, backend: MockBackend) -> Self {
        Self {
            backend: Arc::new(backend),
            ledger: Arc::new(MemoryLedger::new()),
            clock: Arc::new(ManualClock::new(start)),
            mirror_dir: tempfile::tempdir().unwrap(),
            retry: RetryPolicy::forever(Duration::from_secs(30)),
        }
    }

    pub fn context(&self) -> Context {
        Context {
            backend: self.backend.clone(),
            ledger: self.ledger.clone(),
            mirror: LocalMirror::new(self.mirror_dir.path()),
            clock: self.clock.clone(),
            retry: self.retry,
        }
    }

    /// Files left behind in the local mirror directory.
    pub fn mirrored_files(&self) -> usize {
        std::fs::read_dir(self.mirror_dir.path()).map(|entries| entries.count()).unwrap_or(0)
    }
}

pub fn tabular_layout() -> PodLayout {
    PodLayout::new("csv-aqm-data", "aqm1")
}

pub fn graph_layout() -> PodLayout {
    PodLayout::new("ttl-aqm-data", "aqm1")
}

pub fn every(secs: u64, tick_secs: u64) -> Polling {
    Polling {
        interval: Duration::from_secs(secs),
        tick: Duration::from_secs(tick_secs),
    }
}
