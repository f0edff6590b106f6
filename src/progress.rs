//! Interval-based progress logging for the record reader.

use std::time::Instant;
use log::info;

/// Logs a line each time the running count crosses a multiple of `interval`.
pub struct ProgressTracker {
    interval: u64,
    message: String,
    count: u64,
    started: Instant,
}

impl ProgressTracker {
    /// Starts at zero with an interval of 1,000,000.
    pub fn new(message: impl Into<String>) -> Self {
        Self { interval: 1_000_000, message: message.into(), count: 0, started: Instant::now() }
    }

    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Adds `additional` and logs once per interval boundary crossed.
    /// Returns the number of lines logged.
    pub fn record(&mut self, additional: u64) -> u64 {
        let prev = self.count;
        self.count += additional;

        let crossed = self.count / self.interval - prev / self.interval;
        for i in (prev / self.interval + 1)..=(self.count / self.interval) {
            info!("{} {} ({:.1}s)", self.message, i * self.interval, self.started.elapsed().as_secs_f64());
        }
        crossed
    }

    pub fn log_final(&self) {
        info!("{} {} (complete)", self.message, self.count());
    }
}
