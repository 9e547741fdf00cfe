//! Fixed-capacity FIFO used for the live readings and the risk history.
//!
//! Appending past capacity evicts the oldest entry; the buffer never blocks
//! and never grows beyond its capacity.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Creates an empty buffer. A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `item`, returning the evicted oldest entry when full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently appended entry.
    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter()
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Copy of the contents, oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{READING_CAPACITY, RISK_HISTORY_CAPACITY};

    #[test]
    fn test_length_never_exceeds_capacity() {
        let mut buffer = RingBuffer::with_capacity(READING_CAPACITY);
        for i in 0..250 {
            buffer.push(i);
            assert!(buffer.len() <= READING_CAPACITY);
        }
        assert_eq!(buffer.len(), READING_CAPACITY);
    }

    #[test]
    fn test_keeps_last_capacity_items_in_order() {
        for k in [0, 1, 7, RISK_HISTORY_CAPACITY] {
            let mut buffer = RingBuffer::with_capacity(RISK_HISTORY_CAPACITY);
            let total = RISK_HISTORY_CAPACITY + k;
            for i in 0..total {
                buffer.push(i);
            }

            let expected: Vec<usize> = (k..total).collect();
            assert_eq!(buffer.to_vec(), expected, "after {} extra appends", k);
        }
    }

    #[test]
    fn test_push_reports_evicted_item() {
        let mut buffer = RingBuffer::with_capacity(2);
        assert_eq!(buffer.push("a"), None);
        assert_eq!(buffer.push("b"), None);
        assert_eq!(buffer.push("c"), Some("a"));
        assert_eq!(buffer.last(), Some(&"c"));
        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn test_partial_fill_preserves_everything() {
        let mut buffer = RingBuffer::with_capacity(5);
        buffer.push(1.5);
        buffer.push(2.5);
        assert_eq!(buffer.to_vec(), vec![1.5, 2.5]);
        assert!(!buffer.is_empty());
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let mut buffer = RingBuffer::with_capacity(0);
        buffer.push(1);
        buffer.push(2);
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.to_vec(), vec![2]);
    }
}
