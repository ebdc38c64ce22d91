//! Bounded Sample History
//!
//! Provides a fixed-capacity FIFO store for one sensor channel. The oldest
//! entry is evicted when a push would exceed capacity.

mod history;

pub use history::{BoundedHistory, DEFAULT_CAPACITY};

/// A sample that carries its arrival time (seconds since the UNIX epoch)
pub trait Timestamped {
    fn timestamp(&self) -> f64;
}
