//! Cooperative one-shot job scheduler.
//!
//! Nothing runs in the background: the owner calls
//! [`run_pending`](Scheduler::run_pending) from its own wait loop and receives
//! the jobs that have come due.

use time::{PrimitiveDateTime, Time};

#[derive(Debug)]
struct Job<T> {
    due: PrimitiveDateTime,
    task: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    /// Ordered by due time; ties keep arming order
    jobs: Vec<Job<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self { jobs: Vec::new() }
    }
}

/// First occurrence of `at` strictly after `now`: today if still ahead,
/// otherwise tomorrow.
pub fn next_occurrence(at: Time, now: PrimitiveDateTime) -> PrimitiveDateTime {
    let today = now.date().with_time(at);
    match today > now {
        true => today,
        false => today + time::Duration::DAY,
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `task` to run once, at the next occurrence of the wall-clock time
    /// `at`. Returns when it will be due.
    pub fn once_at(&mut self, at: Time, now: PrimitiveDateTime, task: T) -> PrimitiveDateTime {
        let due = next_occurrence(at, now);
        let index = self.jobs.partition_point(|job| job.due <= due);
        self.jobs.insert(index, Job { due, task });
        due
    }

    /// Remove and return every job due at or before `now`, earliest first.
    pub fn run_pending(&mut self, now: PrimitiveDateTime) -> Vec<T> {
        let due = self.jobs.partition_point(|job| job.due <= now);
        self.jobs.drain(..due).map(|job| job.task).collect()
    }

    pub fn next_due(&self) -> Option<PrimitiveDateTime> {
        self.jobs.first().map(|job| job.due)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
