//! Unsorted reference sequence searched linearly.
//!
//! This is the baseline the hash table is measured against: records are kept
//! in insertion order and every lookup walks from the front.

use chainmap::Record;

/// An append-only sequence of records.
#[derive(Debug, Clone)]
pub struct Sequence<R> {
    items: Vec<R>,
}

impl<R: Record> Sequence<R> {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create an empty sequence with room for `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Append a record, keeping input order. Duplicates are not checked.
    pub fn push(&mut self, record: R) {
        self.items.push(record);
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// First record whose key equals `key`, scanning from index 0.
    ///
    /// O(n) per call: a miss always compares against every record.
    pub fn linear_search(&self, key: &str) -> Option<&R> {
        for record in &self.items {
            if record.key() == key {
                return Some(record);
            }
        }
        None
    }

    /// Records in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.items.iter()
    }
}

impl<R: Record> Default for Sequence<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> FromIterator<R> for Sequence<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
