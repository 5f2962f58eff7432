//! Time provider abstraction for testable time-dependent logic

use std::time::{SystemTime, UNIX_EPOCH};

/// Abstraction over the wall clock
pub trait TimeProvider: Send + Sync {
    /// Get the current system time (for timestamps)
    fn system_time(&self) -> SystemTime;

    /// Whole seconds since the Unix epoch, truncated
    fn unix_seconds(&self) -> u64 {
        self.system_time()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Production time provider using actual system time
#[derive(Default, Clone)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

#[cfg(test)]
pub use mock::MockTimeProvider;
