//! Matchbook Clock Infrastructure
//!
//! Time sources for the order book:
//!
//! - [`SystemClock`]: wall-clock time, may repeat or step backwards
//! - [`FixedClock`]: frozen time that only moves when advanced, for tests
//! - [`MonotonicClock`]: wraps any clock and guarantees strictly increasing
//!   stamps, even when called faster than the wall clock ticks
//!
//! ## Usage
//!
//! ```ignore
//! use matchbook_clock::{MonotonicClock, SystemClock, Clock};
//!
//! let clock = MonotonicClock::new(SystemClock::new());
//! let a = clock.now();
//! let b = clock.now();
//! assert!(b > a);
//! ```

mod fixed;
mod monotonic;
mod system;

pub use fixed::FixedClock;
pub use monotonic::MonotonicClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use matchbook_ports::Clock;
