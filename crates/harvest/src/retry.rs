//! Fixed-delay retry of transient operations.

use crate::clock::Clock;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    /// Total attempts allowed; `None` retries forever
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn forever(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }
}

/// Run `operation` until it succeeds, sleeping `policy.delay` after each
/// failure. There is no backoff: every failure is assumed to be transient.
///
/// `purpose` completes the sentence "Unable to ...", e.g. `"read file"`.
///
/// # Errors
///
/// Only when the policy limits attempts and all of them failed:
/// [`RetriesExhausted`](ErrorKind::RetriesExhausted), with the last failure
/// as its source.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, clock: &dyn Clock, purpose: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, exn::Exn<E>>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempt, "Able to {purpose} again");
                }
                return Ok(value);
            },
            Err(err) => err,
        };
        if let Some(max_attempts) = policy.max_attempts
            && attempt >= max_attempts
        {
            tracing::error!(attempt, error = ?err, "Unable to {purpose}. Giving up.");
            return Err(err).or_raise(|| ErrorKind::RetriesExhausted {
                purpose: purpose.to_string(),
                attempts: attempt,
            });
        }
        tracing::warn!(attempt, error = ?err, "Unable to {purpose}. Will retry in {}s.", policy.delay.as_secs());
        clock.sleep(policy.delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use derive_more::{Display, Error};
    use std::sync::atomic::{AtomicU32, Ordering};
    use time::macros::datetime;

    #[derive(Debug, Display, Error)]
    #[display("flaky")]
    struct Flaky;

    fn flaky(calls: &AtomicU32, failures: u32) -> std::result::Result<u32, exn::Exn<Flaky>> {
        let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
        match call <= failures {
            true => Err(exn::Exn::from(Flaky)),
            false => Ok(call),
        }
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let clock = ManualClock::new(datetime!(2022-03-21 11:19:47));
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::forever(Duration::from_secs(30));
        let value = retry(&policy, &clock, "get data", || std::future::ready(flaky(&calls, 3))).await.unwrap();
        assert_eq!(value, 4);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(30); 3]);
        assert_eq!(clock.now(), datetime!(2022-03-21 11:21:17));
    }

    #[tokio::test]
    async fn test_first_success_does_not_sleep() {
        let clock = ManualClock::new(datetime!(2022-03-21 11:19:47));
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::forever(Duration::from_secs(30));
        assert_eq!(retry(&policy, &clock, "get data", || std::future::ready(flaky(&calls, 0))).await.unwrap(), 1);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let clock = ManualClock::new(datetime!(2022-03-21 11:19:47));
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            delay: Duration::from_secs(5),
            max_attempts: Some(3),
        };
        let err = retry(&policy, &clock, "read file", || std::future::ready(flaky(&calls, 10))).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::RetriesExhausted { attempts: 3, purpose } if purpose == "read file"));
        assert!(err.is_fatal());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // No sleep after the final attempt.
        assert_eq!(clock.sleeps().len(), 2);
    }
}
