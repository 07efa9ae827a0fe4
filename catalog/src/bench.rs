//! Lookup benchmark: chained hash table vs. linear search.
//!
//! Both structures are built from the same [`dataset`]. Each round draws a
//! fresh set of existing keys (without replacement) and a set of keys that
//! cannot be present, then times four batches in a fixed order:
//!
//! 1. table, existing keys
//! 2. sequence, existing keys
//! 3. table, missing keys
//! 4. sequence, missing keys
//!
//! Key sampling is seeded, so the same config always queries the same keys.
//! The timings themselves naturally vary between runs.

use std::fmt;
use std::time::Instant;

use chainmap::{ChainedTable, Config, InsertPolicy};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::product::{dataset, item_id, Item};
use crate::sequence::Sequence;
use crate::timing::{nanos, time_batch, Batch, Elapsed};

/// Benchmark parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    /// Dataset size N.
    pub records: usize,
    /// Queries per class per round, M.
    pub queries: usize,
    /// Number of rounds, R.
    pub rounds: usize,
    /// Hash table bucket count.
    pub bucket_count: usize,
    /// Seed for key sampling.
    pub seed: u64,
    /// Insert policy of the table. Ids are unique, so either works.
    pub policy: InsertPolicy,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            records: 100_000,
            queries: 1_000,
            rounds: 10,
            bucket_count: 131_071,
            seed: 42,
            policy: InsertPolicy::Replace,
        }
    }
}

impl BenchConfig {
    /// Check the parameters describe a runnable benchmark.
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.records == 0 {
            return Err(BenchError::ZeroRecords);
        }
        if self.queries == 0 {
            return Err(BenchError::ZeroQueries);
        }
        if self.rounds == 0 {
            return Err(BenchError::ZeroRounds);
        }
        if self.bucket_count == 0 {
            return Err(BenchError::ZeroBuckets);
        }
        if self.queries > self.records {
            return Err(BenchError::TooManyQueries {
                queries: self.queries,
                records: self.records,
            });
        }
        Ok(())
    }
}

/// Invalid benchmark configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BenchError {
    /// N must be positive.
    #[error("dataset must contain at least one record")]
    ZeroRecords,
    /// M must be positive.
    #[error("query count must be positive")]
    ZeroQueries,
    /// R must be positive.
    #[error("round count must be positive")]
    ZeroRounds,
    /// The table needs at least one bucket.
    #[error("bucket count must be positive")]
    ZeroBuckets,
    /// Existing keys are sampled without replacement.
    #[error("cannot sample {queries} distinct existing keys from {records} records")]
    TooManyQueries {
        /// Requested M.
        queries: usize,
        /// Available N.
        records: usize,
    },
    /// The table rejected the dataset.
    #[error("table error: {0}")]
    Table(#[from] chainmap::Error),
}

/// Draw one round's query keys.
///
/// Existing keys are `queries` distinct ids from `[0, records)`. Missing keys
/// use indices from `[records, 10 * records]`, so they share the id format
/// but never match a record.
pub fn sample_keys(rng: &mut StdRng, records: usize, queries: usize) -> (Vec<String>, Vec<String>) {
    let existing = rand::seq::index::sample(rng, records, queries)
        .into_iter()
        .map(item_id)
        .collect();
    let upper = records.saturating_mul(10);
    let missing = (0..queries)
        .map(|_| item_id(rng.gen_range(records..=upper)))
        .collect();
    (existing, missing)
}

/// Nanoseconds spent building each structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildTimes {
    /// All inserts into the table.
    pub table: u64,
    /// All appends to the sequence.
    pub sequence: u64,
}

/// Resident memory sampled around the build, when the platform reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUsage {
    /// Physical bytes before building.
    pub before: Option<usize>,
    /// Physical bytes after building.
    pub after: Option<usize>,
}

impl MemoryUsage {
    fn sample() -> Option<usize> {
        memory_stats::memory_stats().map(|s| s.physical_mem)
    }

    /// Growth across the build in bytes.
    pub fn delta(&self) -> Option<usize> {
        Some(self.after?.saturating_sub(self.before?))
    }
}

/// The four batches of one round plus its elapsed time.
#[derive(Debug, Clone, Copy)]
pub struct RoundResult {
    /// 1-based round number.
    pub round: usize,
    /// Table, existing keys.
    pub table_existing: Batch,
    /// Sequence, existing keys.
    pub sequence_existing: Batch,
    /// Table, missing keys.
    pub table_missing: Batch,
    /// Sequence, missing keys.
    pub sequence_missing: Batch,
    /// Whole-round elapsed time.
    pub elapsed: Elapsed,
}

/// Both structures, built and ready to query.
pub struct Harness {
    config: BenchConfig,
    table: ChainedTable<Item>,
    sequence: Sequence<Item>,
    build: BuildTimes,
    memory: MemoryUsage,
}

impl Harness {
    /// Validate `config` and build the table and the sequence from the same
    /// records.
    pub fn new(config: BenchConfig) -> Result<Self, BenchError> {
        config.validate()?;
        let items = dataset(config.records);
        let before = MemoryUsage::sample();

        let mut table = ChainedTable::with_config(Config {
            bucket_count: config.bucket_count,
            policy: config.policy,
        })?;
        let start = Instant::now();
        for item in &items {
            table.insert(item.clone())?;
        }
        let table_ns = nanos(start.elapsed());

        let mut sequence = Sequence::with_capacity(items.len());
        let start = Instant::now();
        for item in items {
            sequence.push(item);
        }
        let sequence_ns = nanos(start.elapsed());

        let memory = MemoryUsage {
            before,
            after: MemoryUsage::sample(),
        };
        let stats = table.stats();
        debug!(
            records = config.records,
            occupied = stats.occupied,
            longest_chain = stats.longest_chain,
            load_factor = stats.load_factor,
            "built benchmark structures"
        );

        Ok(Self {
            config,
            table,
            sequence,
            build: BuildTimes {
                table: table_ns,
                sequence: sequence_ns,
            },
            memory,
        })
    }

    /// The hash table under test.
    pub fn table(&self) -> &ChainedTable<Item> {
        &self.table
    }

    /// The linear-search baseline.
    pub fn sequence(&self) -> &Sequence<Item> {
        &self.sequence
    }

    /// Run every round and collect the report.
    pub fn run(&self) -> Report {
        let config = &self.config;
        info!(
            records = config.records,
            queries = config.queries,
            rounds = config.rounds,
            bucket_count = config.bucket_count,
            "running lookup benchmark"
        );

        let mut rng = StdRng::seed_from_u64(config.seed);
        let rounds: Vec<RoundResult> = (1..=config.rounds)
            .map(|round| {
                let (existing, missing) = sample_keys(&mut rng, config.records, config.queries);
                self.run_round(round, &existing, &missing)
            })
            .collect();

        let report = Report {
            config: config.clone(),
            build: self.build,
            memory: self.memory,
            rounds,
            table_len: self.table.len(),
            sequence_len: self.sequence.len(),
        };
        info!(
            existing_ratio = report.existing_ratio(),
            missing_ratio = report.missing_ratio(),
            "lookup benchmark finished"
        );
        report
    }

    /// Time the four batches of one round, sequentially.
    pub fn run_round(&self, round: usize, existing: &[String], missing: &[String]) -> RoundResult {
        let table = &self.table;
        let sequence = &self.sequence;

        let round_start = Instant::now();
        let table_existing = time_batch(existing, |k| table.search(k).is_some());
        let sequence_existing = time_batch(existing, |k| sequence.linear_search(k).is_some());
        let table_missing = time_batch(missing, |k| table.search(k).is_some());
        let sequence_missing = time_batch(missing, |k| sequence.linear_search(k).is_some());
        let round_end = Instant::now();

        let elapsed = Elapsed::measure(
            &[table_existing, sequence_existing, table_missing, sequence_missing],
            round_start,
            round_end,
        );
        if elapsed.used_fallback() {
            warn!(round, fallback = elapsed.fallback, "batch timestamps gave zero elapsed, using wrap-around time");
        }
        debug!(
            round,
            table_existing = table_existing.nanos(),
            sequence_existing = sequence_existing.nanos(),
            table_missing = table_missing.nanos(),
            sequence_missing = sequence_missing.nanos(),
            "round complete"
        );

        RoundResult {
            round,
            table_existing,
            sequence_existing,
            table_missing,
            sequence_missing,
            elapsed,
        }
    }
}

/// Results of a full benchmark run.
#[derive(Debug, Clone)]
pub struct Report {
    /// Parameters the run used.
    pub config: BenchConfig,
    /// Build durations.
    pub build: BuildTimes,
    /// Memory around the build.
    pub memory: MemoryUsage,
    /// One entry per round, in order.
    pub rounds: Vec<RoundResult>,
    /// `len()` of the table after building.
    pub table_len: usize,
    /// Length of the sequence after building.
    pub sequence_len: usize,
}

fn ratio(sequence_avg: f64, table_avg: f64) -> f64 {
    if table_avg > 0.0 {
        sequence_avg / table_avg
    } else {
        f64::INFINITY
    }
}

impl Report {
    fn average(&self, f: impl Fn(&RoundResult) -> u64) -> f64 {
        if self.rounds.is_empty() {
            return 0.0;
        }
        self.rounds.iter().map(|r| f(r) as f64).sum::<f64>() / self.rounds.len() as f64
    }

    /// Mean table time for existing keys, ns per batch.
    pub fn table_existing_avg(&self) -> f64 {
        self.average(|r| r.table_existing.nanos())
    }

    /// Mean sequence time for existing keys, ns per batch.
    pub fn sequence_existing_avg(&self) -> f64 {
        self.average(|r| r.sequence_existing.nanos())
    }

    /// Mean table time for missing keys, ns per batch.
    pub fn table_missing_avg(&self) -> f64 {
        self.average(|r| r.table_missing.nanos())
    }

    /// Mean sequence time for missing keys, ns per batch.
    pub fn sequence_missing_avg(&self) -> f64 {
        self.average(|r| r.sequence_missing.nanos())
    }

    /// Mean chosen elapsed time per round.
    pub fn elapsed_avg(&self) -> f64 {
        self.average(|r| r.elapsed.chosen())
    }

    /// Sequence / table for existing keys. Above 1 means the table is faster.
    pub fn existing_ratio(&self) -> f64 {
        ratio(self.sequence_existing_avg(), self.table_existing_avg())
    }

    /// Sequence / table for missing keys.
    pub fn missing_ratio(&self) -> f64 {
        ratio(self.sequence_missing_avg(), self.table_missing_avg())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.config;
        writeln!(
            f,
            "Config: N={}, M={}, ROUNDS={}, HashTable buckets={}, policy={:?}, seed={}",
            c.records, c.queries, c.rounds, c.bucket_count, c.policy, c.seed
        )?;
        writeln!(
            f,
            "Build times (ns): HashTable={}, Sequence append={}",
            self.build.table, self.build.sequence
        )?;
        match self.memory.delta() {
            Some(bytes) => writeln!(f, "Resident memory growth during build: {} bytes", bytes)?,
            None => writeln!(f, "Resident memory growth during build: unavailable")?,
        }
        writeln!(f)?;

        for r in &self.rounds {
            writeln!(
                f,
                "Round {:2}: HT(existing)={} ns, SEQ(existing)={} ns, HT(missing)={} ns, SEQ(missing)={} ns, elapsed={} ns{}",
                r.round,
                r.table_existing.nanos(),
                r.sequence_existing.nanos(),
                r.table_missing.nanos(),
                r.sequence_missing.nanos(),
                r.elapsed.chosen(),
                if r.elapsed.used_fallback() {
                    format!(" (fallback; primary={} ns)", r.elapsed.primary)
                } else {
                    String::new()
                },
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Averages over rounds (ns):")?;
        writeln!(f, "  HashTable existing avg: {:.0} ns", self.table_existing_avg())?;
        writeln!(f, "  Sequence existing  avg: {:.0} ns", self.sequence_existing_avg())?;
        writeln!(f, "  HashTable missing  avg: {:.0} ns", self.table_missing_avg())?;
        writeln!(f, "  Sequence missing   avg: {:.0} ns", self.sequence_missing_avg())?;
        writeln!(f, "  Round elapsed      avg: {:.0} ns", self.elapsed_avg())?;
        writeln!(f)?;
        writeln!(
            f,
            "Speedup (Sequence / Hash) existing ~ {:.1}x (higher means sequence slower)",
            self.existing_ratio()
        )?;
        writeln!(
            f,
            "Speedup (Sequence / Hash) missing  ~ {:.1}x (higher means sequence slower)",
            self.missing_ratio()
        )?;
        writeln!(f)?;
        write!(
            f,
            "Counts sanity check: HashTable stored {}, Sequence stored {}",
            self.table_len, self.sequence_len
        )
    }
}
