//! Fixed-capacity FIFO histories.
//!
//! The buffer is kept contiguous after every push so callers can borrow the
//! whole window as one slice through a shared reference.

use std::collections::VecDeque;

/// A ring buffer that evicts its oldest entry once full.
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedHistory<T> {
    /// Create an empty history. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append, evicting from the front while over capacity.
    pub fn push(&mut self, item: T) {
        while self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
        self.items.make_contiguous();
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

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    /// All entries, oldest first.
    pub fn as_slice(&self) -> &[T] {
        // Contiguous after every push, so the second half is always empty.
        self.items.as_slices().0
    }

    /// The newest `n` entries (or fewer), oldest first.
    pub fn tail(&self, n: usize) -> &[T] {
        let slice = self.as_slice();
        let start = slice.len().saturating_sub(n);
        &slice[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest_first() {
        let mut h = BoundedHistory::new(3);
        for i in 0..5 {
            h.push(i);
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(h.latest(), Some(&4));
    }

    #[test]
    fn test_tail() {
        let mut h = BoundedHistory::new(10);
        for i in 0..6 {
            h.push(i);
        }
        assert_eq!(h.tail(2), &[4, 5]);
        assert_eq!(h.tail(20), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(h.as_slice().len(), 6);
    }

    #[test]
    fn test_slice_stays_whole_after_wraparound() {
        let mut h = BoundedHistory::new(4);
        for i in 0..11 {
            h.push(i);
            assert_eq!(h.as_slice().len(), h.len());
        }
        assert_eq!(h.as_slice(), &[7, 8, 9, 10]);
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let mut h = BoundedHistory::new(0);
        h.push("a");
        h.push("b");
        assert_eq!(h.capacity(), 1);
        assert_eq!(h.iter().copied().collect::<Vec<_>>(), vec!["b"]);
    }
}
