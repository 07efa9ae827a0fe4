//! # catalog
//!
//! Product records stored in a [`chainmap::ChainedTable`], plus the two
//! programs built on them:
//!
//! - **Lookup benchmark** ([`bench`]): builds a 100k-record table and an
//!   unsorted [`Sequence`] from the same data, then times batches of
//!   existing-key and missing-key searches against both.
//! - **Inventory shell** ([`inventory`]): parses text commands into validated
//!   requests and applies them to a product table.
//!
//! ## Example
//!
//! ```rust
//! use catalog::{BenchConfig, Harness};
//!
//! let config = BenchConfig {
//!     records: 1_000,
//!     queries: 10,
//!     rounds: 2,
//!     ..BenchConfig::default()
//! };
//! let report = Harness::new(config).unwrap().run();
//! assert_eq!(report.rounds.len(), 2);
//! assert_eq!(report.table_len, report.sequence_len);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bench;
pub mod inventory;
pub mod product;
pub mod sequence;
pub mod timing;

pub use bench::{BenchConfig, BenchError, Harness, Report, RoundResult};
pub use inventory::{Command, Inventory, Outcome, ParseError};
pub use product::{dataset, Item, Product};
pub use sequence::Sequence;

use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber used by the binaries.
///
/// Defaults to `info`; `RUST_LOG` overrides it. Stdout stays reserved for
/// program output.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
