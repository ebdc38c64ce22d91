//! Bounded History Implementation

use crate::Timestamped;
use serde::{Serialize, Serializer};
use std::collections::VecDeque;

/// Default history capacity (samples per channel)
pub const DEFAULT_CAPACITY: usize = 10;

/// Fixed-capacity FIFO history, oldest entry at the front
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedHistory<T> {
    /// Entries in arrival order
    data: VecDeque<T>,
    /// Maximum number of retained entries (>= 1)
    capacity: usize,
}

impl<T> BoundedHistory<T> {
    /// Create a new history; a zero capacity is raised to 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Create a history with the default capacity (10 samples)
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Append an item, evicting the single oldest entry when full
    pub fn push(&mut self, item: T) {
        if self.data.len() >= self.capacity {
            self.data.pop_front();
        }
        self.data.push_back(item);
    }

    /// Most recently pushed item
    pub fn latest(&self) -> Option<&T> {
        self.data.back()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate entries oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.data.iter()
    }

}

impl<T: Clone> BoundedHistory<T> {
    /// Copy of the entries, oldest first
    pub fn to_vec(&self) -> Vec<T> {
        self.data.iter().cloned().collect()
    }
}

impl<T: Timestamped> BoundedHistory<T> {
    /// Entries with `now - timestamp <= seconds`, newest first.
    ///
    /// Scanning stops at the first entry older than the window, so entries
    /// must have been pushed in non-decreasing timestamp order.
    pub fn within_window(&self, now: f64, seconds: f64) -> impl Iterator<Item = &T> {
        self.data
            .iter()
            .rev()
            .take_while(move |item| now - item.timestamp() <= seconds)
    }
}

impl<T> Default for BoundedHistory<T> {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl<T: Serialize> Serialize for BoundedHistory<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.data.iter())
    }
}
