//! Hash table vs. linear search over 100,000 products.

use std::process::ExitCode;

use catalog::{BenchConfig, Harness};
use tracing::error;

fn main() -> ExitCode {
    catalog::init_logging();

    let harness = match Harness::new(BenchConfig::default()) {
        Ok(harness) => harness,
        Err(err) => {
            error!(%err, "invalid benchmark configuration");
            return ExitCode::FAILURE;
        }
    };

    println!("{}", harness.run());
    ExitCode::SUCCESS
}
