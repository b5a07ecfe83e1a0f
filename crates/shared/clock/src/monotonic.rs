use chrono::DateTime;
use matchbook_core::Timestamp;
use matchbook_ports::Clock;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::fixed::to_nanos;

/// Hybrid clock producing strictly increasing timestamps
///
/// Each reading is `max(wall, last + 1ns)`: it follows the wrapped clock
/// while that clock moves forward, and falls back to a logical nanosecond
/// counter when the wrapped clock repeats a value or steps backwards.
/// It never waits for the wrapped clock to advance.
pub struct MonotonicClock<C: Clock> {
    inner: C,
    /// Last issued stamp, nanoseconds since the epoch
    last: AtomicI64,
}

impl<C: Clock> MonotonicClock<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            last: AtomicI64::new(i64::MIN),
        }
    }
}

impl<C: Clock> Clock for MonotonicClock<C> {
    fn now(&self) -> Timestamp {
        let wall = to_nanos(self.inner.now());
        let step = |prev: i64| wall.max(prev.saturating_add(1));

        // The closure always returns Some, so both arms carry the previous value
        let prev = match self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |prev| Some(step(prev)))
        {
            Ok(prev) | Err(prev) => prev,
        };

        DateTime::from_timestamp_nanos(step(prev))
    }

    fn name(&self) -> &str {
        "MonotonicClock"
    }
}
