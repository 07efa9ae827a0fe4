//! Interactive product inventory.
//!
//! Reads one command per line from stdin; `help` lists them.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use catalog::{Command, Inventory, Outcome};
use tracing::{error, info};

fn main() -> ExitCode {
    catalog::init_logging();

    let mut inventory = match Inventory::with_samples() {
        Ok(inventory) => inventory,
        Err(err) => {
            error!(%err, "failed to load sample products");
            return ExitCode::FAILURE;
        }
    };
    info!(products = inventory.len(), "sample products loaded");
    println!("=== Baby Shop Inventory === (type `help` for commands)");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        if stdout.flush().is_err() {
            return ExitCode::FAILURE;
        }
        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(err)) => {
                error!(%err, "failed to read input");
                return ExitCode::FAILURE;
            }
            None => break,
        };

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(err) => {
                println!("{}", err);
                continue;
            }
        };
        match inventory.apply(command) {
            Ok(Outcome::Quit) => {
                println!("{}", Outcome::Quit);
                break;
            }
            Ok(outcome) => println!("{}", outcome),
            Err(err) => println!("{}", err),
        }
    }
    ExitCode::SUCCESS
}
