//! Batch timing on the monotonic clock.
//!
//! A round runs several query batches back to back. Each batch records its
//! own start and end [`Instant`]; the round's elapsed time is derived from
//! those timestamps, with an independently measured wrap-around duration as
//! the fallback when clock granularity makes the derived value zero.

use std::hint::black_box;
use std::time::{Duration, Instant};

/// Saturating conversion to whole nanoseconds.
pub fn nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// One timed batch of lookups.
#[derive(Debug, Clone, Copy)]
pub struct Batch {
    /// Taken immediately before the first lookup.
    pub start: Instant,
    /// Taken immediately after the last lookup.
    pub end: Instant,
    /// Lookups that found a record.
    pub hits: usize,
}

impl Batch {
    /// Batch duration in nanoseconds.
    pub fn nanos(&self) -> u64 {
        nanos(self.end.saturating_duration_since(self.start))
    }
}

/// Run `lookup` over every key back to back and time the whole batch.
///
/// Keys and results go through [`black_box`] so the loop can't be folded
/// away.
pub fn time_batch<F>(keys: &[String], mut lookup: F) -> Batch
where
    F: FnMut(&str) -> bool,
{
    let mut hits = 0;
    let start = Instant::now();
    for key in keys {
        if black_box(lookup(black_box(key.as_str()))) {
            hits += 1;
        }
    }
    let end = Instant::now();
    Batch { start, end, hits }
}

/// Elapsed time of a round, measured two ways.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed {
    /// Latest batch end minus earliest batch start, in nanoseconds.
    pub primary: u64,
    /// Instant before the first batch to instant after the last, in
    /// nanoseconds.
    pub fallback: u64,
}

impl Elapsed {
    /// Derive both measurements for a round.
    pub fn measure(batches: &[Batch], round_start: Instant, round_end: Instant) -> Self {
        let first_start = batches.iter().map(|b| b.start).min();
        let last_end = batches.iter().map(|b| b.end).max();
        let primary = match (first_start, last_end) {
            (Some(s), Some(e)) => nanos(e.saturating_duration_since(s)),
            _ => 0,
        };
        Self {
            primary,
            fallback: nanos(round_end.saturating_duration_since(round_start)),
        }
    }

    /// The value reported for the round: `primary` unless it is zero.
    pub fn chosen(&self) -> u64 {
        if self.used_fallback() {
            self.fallback
        } else {
            self.primary
        }
    }

    /// Whether `primary` was unusable.
    pub fn used_fallback(&self) -> bool {
        self.primary == 0
    }
}
