//! Time source.
//!
//! Code crash if there is a physical inconsistency (unrecoverable state).

use chrono::{DateTime, Utc};

/// Port for getting the current time.
pub trait Clock: Send + Sync {
    /// Get the current Unix timestamp in milliseconds.
    fn now_millis(&self) -> u64;

    /// Current time as a UTC date-time.
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now_millis() as i64)
            .unwrap_or_default()
    }
}

/// System clock using the OS time.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time before Unix epoch")
            .as_millis() as u64
    }
}

/// Manually driven clock.
#[cfg(test)]
#[derive(Debug)]
pub struct FixedClock {
    millis: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl FixedClock {
    pub fn new(millis: u64) -> Self {
        Self {
            millis: std::sync::atomic::AtomicU64::new(millis),
        }
    }

    /// Move time forward.
    pub fn advance(&self, millis: u64) {
        self.millis
            .fetch_add(millis, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.millis.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        // 2025-10-30T12:00:00Z.
        let clock = FixedClock::new(1_761_825_600_000);
        assert_eq!(clock.now().date_naive().to_string(), "2025-10-30");

        clock.advance(24 * 3600 * 1000);
        assert_eq!(clock.now().date_naive().to_string(), "2025-10-31");
    }

    #[test]
    fn test_system_clock() {
        assert!(SystemClock.now_millis() > 1_700_000_000_000);
    }
}
