//! Periodic throughput reporting

use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

/// Counts processed queue entries and logs the count on a fixed interval
#[derive(Debug)]
pub struct ProgressReporter {
    interval: Duration,
    last_report: Instant,
    /// Wall-clock start of the current interval
    interval_started: DateTime<Local>,
    processed: u64,
}

impl ProgressReporter {
    pub fn new(interval: Duration) -> Self {
        Self::starting_at(interval, Instant::now())
    }

    /// Creates a reporter whose first interval starts at `start`
    pub fn starting_at(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            last_report: start,
            interval_started: Local::now(),
            processed: 0,
        }
    }

    /// Records one finalized queue entry
    pub fn record(&mut self) {
        self.processed += 1;
    }

    /// Entries processed since the last report
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Wall-clock time the current interval started
    pub fn interval_started(&self) -> DateTime<Local> {
        self.interval_started
    }

    /// Logs and resets the count if the interval has elapsed at `now`
    ///
    /// Returns the reported count.
    pub fn maybe_report(&mut self, now: Instant) -> Option<u64> {
        if now.saturating_duration_since(self.last_report) < self.interval {
            return None;
        }

        let count = self.processed;
        tracing::info!(
            "Processed {} links since {}",
            count,
            self.interval_started.format("%Y-%m-%d %H:%M:%S")
        );

        self.processed = 0;
        self.last_report = now;
        self.interval_started = Local::now();
        Some(count)
    }
}
