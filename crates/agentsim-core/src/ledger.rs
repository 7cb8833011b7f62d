//! Bounded, insertion-ordered record with oldest-first eviction
//!
//! Shared storage for the execution ledger, the data operation log and the
//! alert ledger. Entries are kept oldest-first internally; snapshots are
//! returned most-recent-first.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct BoundedLedger<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedLedger<T> {
    /// Create an empty ledger. Capacity is clamped to at least one entry.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry, returning the evicted oldest entry when at capacity
    pub fn push(&mut self, entry: T) -> Option<T> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        debug_assert!(self.entries.len() <= self.capacity);
        evicted
    }

    /// Iterate most-recent-first
    pub fn iter_recent(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().rev()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut()
    }

    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<&T> {
        self.entries.iter().find(|e| predicate(e))
    }

    pub fn find_mut(&mut self, predicate: impl Fn(&T) -> bool) -> Option<&mut T> {
        self.entries.iter_mut().find(|e| predicate(e))
    }
}

impl<T: Clone> BoundedLedger<T> {
    /// Up to `limit` entries, most-recent-first
    pub fn snapshot(&self, limit: Option<usize>) -> Vec<T> {
        let limit = limit.unwrap_or(self.capacity);
        self.entries.iter().rev().take(limit).cloned().collect()
    }
}
