//! # chainmap
//!
//! A fixed-size, string-keyed hash table that resolves collisions by
//! separate chaining.
//!
//! Every bucket is the head of a singly linked chain of owned nodes. The
//! bucket count is chosen at construction and never changes; placement is
//! `hash(key) % bucket_count` with a hash function owned by the table (see
//! [`hash`]), so the same key lands in the same bucket in every run.
//!
//! ## Example
//!
//! ```rust
//! use chainmap::{ChainedTable, Record};
//!
//! struct Product {
//!     id: String,
//!     stock: u32,
//! }
//!
//! impl Record for Product {
//!     fn key(&self) -> &str {
//!         &self.id
//!     }
//! }
//!
//! let mut table: ChainedTable<Product> = ChainedTable::new(101);
//! table.insert(Product { id: "BB001".into(), stock: 100 }).unwrap();
//! table.insert(Product { id: "BB001".into(), stock: 90 }).unwrap();
//!
//! assert_eq!(table.len(), 1);
//! assert_eq!(table.search("BB001").map(|p| p.stock), Some(90));
//! assert!(table.remove("BB001").is_some());
//! assert!(table.search("BB001").is_none());
//! ```

#![forbid(unsafe_code)]

pub mod hash;

pub use hash::{Fnv1a, KeyHasher};

use std::fmt;
use std::iter::FusedIterator;
use std::mem;

use thiserror::Error;
use tracing::{debug, trace};

// =============================================================================
// Configuration
// =============================================================================

/// Bucket count used by [`Config::default`].
///
/// Prime sizes avoid the clustering power-of-two sizes show when digests
/// have periodic low bits. Sizes in use: 101 for small inventories, 1031 as
/// the general default, 131071 for 100k-record benchmarks.
pub const DEFAULT_BUCKET_COUNT: usize = 1031;

/// How [`ChainedTable::insert`] treats a key that is already present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InsertPolicy {
    /// Overwrite the stored record in place. The chain shape and the length
    /// are untouched. This is the default contract.
    #[default]
    Replace,
    /// Always prepend a new node, so duplicates coexist. Searches and
    /// removals see the most recent duplicate first. Kept for compatibility
    /// with callers that relied on the older behaviour.
    Prepend,
}

/// Table construction parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of buckets, fixed for the table's lifetime. Must be positive.
    pub bucket_count: usize,
    /// Duplicate-key handling on insert.
    pub policy: InsertPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            policy: InsertPolicy::default(),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("bucket count must be positive")]
    ZeroBuckets,
    #[error("record key must not be empty")]
    EmptyKey,
}

// =============================================================================
// Records and chain nodes
// =============================================================================

/// A value stored under a string key. Two records are the same entity iff
/// their keys are equal.
pub trait Record {
    fn key(&self) -> &str;
}

impl Record for String {
    fn key(&self) -> &str {
        self
    }
}

impl<V> Record for (String, V) {
    fn key(&self) -> &str {
        &self.0
    }
}

type Link<R> = Option<Box<Node<R>>>;

struct Node<R> {
    record: R,
    next: Link<R>,
}

/// Unlinks nodes one at a time so long chains don't recurse on drop.
fn drop_chain<R>(mut link: Link<R>) {
    while let Some(mut node) = link {
        link = node.next.take();
    }
}

// =============================================================================
// ChainedTable
// =============================================================================

/// Bucket distribution snapshot returned by [`ChainedTable::stats`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChainStats {
    pub buckets: usize,
    /// Buckets with at least one node.
    pub occupied: usize,
    pub longest_chain: usize,
    pub load_factor: f64,
}

/// A string-keyed hash table with a fixed number of chained buckets.
///
/// Single-threaded: callers sharing a table across threads must wrap it in
/// their own lock.
pub struct ChainedTable<R, H = Fnv1a> {
    buckets: Box<[Link<R>]>,
    /// Number of nodes reachable from all buckets.
    count: usize,
    policy: InsertPolicy,
    hasher: H,
}

impl<R: Record> ChainedTable<R> {
    /// Create a table with `bucket_count` buckets and the default policy.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_count` is zero.
    pub fn new(bucket_count: usize) -> Self {
        assert!(bucket_count > 0, "bucket count must be positive");
        Self::build(bucket_count, InsertPolicy::default(), Fnv1a)
    }

    pub fn with_config(config: Config) -> Result<Self, Error> {
        Self::with_hasher(config, Fnv1a)
    }
}

impl<R: Record, H: KeyHasher> ChainedTable<R, H> {
    /// Create a table that places keys with `hasher` instead of FNV-1a.
    pub fn with_hasher(config: Config, hasher: H) -> Result<Self, Error> {
        if config.bucket_count == 0 {
            return Err(Error::ZeroBuckets);
        }
        Ok(Self::build(config.bucket_count, config.policy, hasher))
    }

    fn build(bucket_count: usize, policy: InsertPolicy, hasher: H) -> Self {
        debug!(bucket_count, ?policy, "created chained table");
        Self {
            buckets: std::iter::repeat_with(|| None).take(bucket_count).collect(),
            count: 0,
            policy,
            hasher,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn policy(&self) -> InsertPolicy {
        self.policy
    }

    /// Records per bucket.
    pub fn load_factor(&self) -> f64 {
        self.count as f64 / self.buckets.len() as f64
    }

    /// Index of the bucket `key` belongs to.
    #[inline]
    pub fn bucket_index(&self, key: &str) -> usize {
        (self.hasher.hash(key.as_bytes()) % self.buckets.len() as u64) as usize
    }

    /// Insert a record.
    ///
    /// Under [`InsertPolicy::Replace`] an existing record with the same key is
    /// overwritten and returned. Otherwise a new node becomes the head of its
    /// chain and `Ok(None)` is returned. An empty key is rejected without
    /// touching the table.
    pub fn insert(&mut self, record: R) -> Result<Option<R>, Error> {
        if record.key().is_empty() {
            return Err(Error::EmptyKey);
        }
        let idx = self.bucket_index(record.key());

        if self.policy == InsertPolicy::Replace {
            let mut cur = self.buckets[idx].as_deref_mut();
            while let Some(node) = cur {
                if node.record.key() == record.key() {
                    trace!(key = record.key(), bucket = idx, "replaced record in place");
                    return Ok(Some(mem::replace(&mut node.record, record)));
                }
                cur = node.next.as_deref_mut();
            }
        }

        let next = self.buckets[idx].take();
        self.buckets[idx] = Some(Box::new(Node { record, next }));
        self.count += 1;
        Ok(None)
    }

    /// Find the record stored under `key`, nearest the chain head first.
    pub fn search(&self, key: &str) -> Option<&R> {
        let mut cur = self.buckets[self.bucket_index(key)].as_deref();
        while let Some(node) = cur {
            if node.record.key() == key {
                return Some(&node.record);
            }
            cur = node.next.as_deref();
        }
        None
    }

    /// Mutable access to the record under `key`.
    ///
    /// Changing the record's key through this reference breaks placement;
    /// re-insert instead.
    pub fn search_mut(&mut self, key: &str) -> Option<&mut R> {
        let idx = self.bucket_index(key);
        let mut cur = self.buckets[idx].as_deref_mut();
        while let Some(node) = cur {
            if node.record.key() == key {
                return Some(&mut node.record);
            }
            cur = node.next.as_deref_mut();
        }
        None
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.search(key).is_some()
    }

    /// Unlink the first node matching `key` and return its record.
    ///
    /// With [`InsertPolicy::Prepend`] only the most recent duplicate goes;
    /// older ones stay searchable.
    pub fn remove(&mut self, key: &str) -> Option<R> {
        let idx = self.bucket_index(key);
        let mut link = &mut self.buckets[idx];
        loop {
            if link.as_deref()?.record.key() == key {
                let node = link.take()?;
                let Node { record, next } = *node;
                *link = next;
                self.count -= 1;
                return Some(record);
            }
            link = &mut link.as_mut()?.next;
        }
    }

    /// Drop every record, keeping the bucket count.
    pub fn clear(&mut self) {
        for bucket in self.buckets.iter_mut() {
            drop_chain(bucket.take());
        }
        debug!(dropped = self.count, "cleared chained table");
        self.count = 0;
    }
}

impl<R, H> ChainedTable<R, H> {
    /// All records: buckets in index order, each chain from head to tail.
    pub fn iter(&self) -> Iter<'_, R> {
        Iter {
            buckets: self.buckets.iter(),
            chain: None,
            remaining: self.count,
        }
    }

    /// Records in one bucket, head to tail.
    ///
    /// # Panics
    ///
    /// Panics if `index >= bucket_count()`.
    pub fn chain(&self, index: usize) -> Chain<'_, R> {
        Chain {
            cur: self.buckets[index].as_deref(),
        }
    }

    pub fn stats(&self) -> ChainStats {
        let mut occupied = 0;
        let mut longest_chain = 0;
        for index in 0..self.buckets.len() {
            let len = self.chain(index).count();
            if len > 0 {
                occupied += 1;
            }
            longest_chain = longest_chain.max(len);
        }
        ChainStats {
            buckets: self.buckets.len(),
            occupied,
            longest_chain,
            load_factor: self.count as f64 / self.buckets.len() as f64,
        }
    }
}

impl<R, H> Drop for ChainedTable<R, H> {
    fn drop(&mut self) {
        for bucket in self.buckets.iter_mut() {
            drop_chain(bucket.take());
        }
    }
}

impl<R: Clone, H: Clone> Clone for ChainedTable<R, H> {
    fn clone(&self) -> Self {
        let buckets = self
            .buckets
            .iter()
            .map(|head| {
                // Rebuild tail-first so chain order is preserved.
                let mut records: Vec<&R> = Vec::new();
                let mut cur = head.as_deref();
                while let Some(node) = cur {
                    records.push(&node.record);
                    cur = node.next.as_deref();
                }
                let mut link: Link<R> = None;
                for record in records.into_iter().rev() {
                    link = Some(Box::new(Node {
                        record: record.clone(),
                        next: link,
                    }));
                }
                link
            })
            .collect();
        Self {
            buckets,
            count: self.count,
            policy: self.policy,
            hasher: self.hasher.clone(),
        }
    }
}

impl<R: fmt::Debug, H> fmt::Debug for ChainedTable<R, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, R, H> IntoIterator for &'a ChainedTable<R, H> {
    type Item = &'a R;
    type IntoIter = Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Iterators
// =============================================================================

pub struct Iter<'a, R> {
    buckets: std::slice::Iter<'a, Link<R>>,
    chain: Option<&'a Node<R>>,
    remaining: usize,
}

impl<'a, R> Iterator for Iter<'a, R> {
    type Item = &'a R;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.chain {
                self.chain = node.next.as_deref();
                self.remaining -= 1;
                return Some(&node.record);
            }
            self.chain = self.buckets.next()?.as_deref();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<R> ExactSizeIterator for Iter<'_, R> {}

impl<R> FusedIterator for Iter<'_, R> {}

pub struct Chain<'a, R> {
    cur: Option<&'a Node<R>>,
}

impl<'a, R> Iterator for Chain<'a, R> {
    type Item = &'a R;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.cur?;
        self.cur = node.next.as_deref();
        Some(&node.record)
    }
}

impl<R> FusedIterator for Chain<'_, R> {}


#[cfg(test)]
mod proptests;
