//! Wall-clock time and sleeping.
//!
//! Everything in the harvest loop that waits goes through a [`Clock`], so
//! tests can run a day of polling on virtual time with [`ManualClock`].

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

#[async_trait]
pub trait Clock: Send + Sync {
    /// Current local wall-clock time.
    fn now(&self) -> PrimitiveDateTime;

    async fn sleep(&self, duration: Duration);
}

/// The real clock, in the local time zone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    /// Offset used when the local one cannot be determined at call time
    fallback: UtcOffset,
}

impl SystemClock {
    pub fn new() -> Self {
        let fallback = UtcOffset::current_local_offset().unwrap_or_else(|_| {
            tracing::warn!("Unable to determine the local time zone; timestamps will be in UTC");
            UtcOffset::UTC
        });
        Self { fallback }
    }
}
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> PrimitiveDateTime {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc().to_offset(self.fallback));
        PrimitiveDateTime::new(now.date(), now.time())
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock: sleeping advances time instantly.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<PrimitiveDateTime>,
    slept: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new(start: PrimitiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
            slept: Mutex::new(Vec::new()),
        }
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += duration;
    }

    pub fn set(&self, at: PrimitiveDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }

    /// Every duration passed to [`sleep`](Clock::sleep), in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.slept.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> PrimitiveDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap_or_else(PoisonError::into_inner).push(duration);
        self.advance(duration);
        tokio::task::yield_now().await;
    }
}
