use chrono::{DateTime, Duration, Utc};
use matchbook_core::Timestamp;
use matchbook_ports::Clock;
use std::sync::atomic::{AtomicI64, Ordering};

/// Frozen clock that only moves when explicitly advanced
///
/// Useful for deterministic tests: every reading returns the same instant
/// until `advance` or `set` is called.
pub struct FixedClock {
    /// Current time in nanoseconds since the Unix epoch
    nanos: AtomicI64,
}

impl FixedClock {
    pub fn new(initial: Timestamp) -> Self {
        Self {
            nanos: AtomicI64::new(to_nanos(initial)),
        }
    }

    /// Frozen at the Unix epoch
    pub fn at_epoch() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Move time forward by `duration`
    pub fn advance(&self, duration: Duration) {
        let delta = duration.num_nanoseconds().unwrap_or(i64::MAX);
        let _ = self
            .nanos
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_add(delta))
            });
    }

    /// Explicitly set the time; may move it backwards
    pub fn set(&self, time: Timestamp) {
        self.nanos.store(to_nanos(time), Ordering::Release);
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::at_epoch()
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        DateTime::from_timestamp_nanos(self.nanos.load(Ordering::Acquire))
    }

    fn name(&self) -> &str {
        "FixedClock"
    }
}

/// Nanoseconds since the epoch, saturating outside the representable range
/// (years 1677 to 2262).
pub(crate) fn to_nanos(time: Timestamp) -> i64 {
    time.timestamp_nanos_opt().unwrap_or(if time.timestamp() < 0 {
        i64::MIN
    } else {
        i64::MAX
    })
}
