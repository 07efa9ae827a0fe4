//! Line-oriented inventory commands over a chained table.
//!
//! Parsing and validation live here so the table only ever sees well-formed
//! records. A front end reads a line, calls [`Command::parse`], hands the
//! command to [`Inventory::apply`] and prints the [`Outcome`].
//!
//! Grammar (verbs are case-insensitive):
//!
//! ```text
//! insert <id> | <name> | <category> | <price> | <stock>
//! edit   <id> | <name> | <category> | <price> | <stock>
//! search <id>
//! delete <id>
//! list
//! help
//! quit
//! ```

use std::fmt;

use chainmap::{ChainedTable, Config, InsertPolicy};
use thiserror::Error;
use tracing::debug;

use crate::product::{sample_products, Product};

/// Bucket count for a shop-sized inventory.
pub const INVENTORY_BUCKETS: usize = 101;

/// A validated inventory request.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Add a product, overwriting one with the same id.
    Insert(Product),
    /// Replace an existing product's fields.
    Edit(Product),
    /// Look a product up by id.
    Search(String),
    /// Remove a product by id.
    Delete(String),
    /// Show every product.
    List,
    /// Show the grammar.
    Help,
    /// Leave the shell.
    Quit,
}

/// Why a line was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Blank input.
    #[error("empty command")]
    Empty,
    /// First word is not a known verb.
    #[error("unknown command `{0}` (try `help`)")]
    UnknownCommand(String),
    /// Product id missing or blank.
    #[error("product id cannot be empty")]
    EmptyId,
    /// Record commands need exactly five `|`-separated fields.
    #[error("expected {expected} fields separated by `|`, found {found}")]
    FieldCount {
        /// Always five.
        expected: usize,
        /// Fields present.
        found: usize,
    },
    /// Price did not parse as a finite number.
    #[error("invalid price `{0}`")]
    InvalidPrice(String),
    /// Stock did not parse as an integer.
    #[error("invalid stock `{0}`")]
    InvalidStock(String),
    /// A verb that takes no arguments got some.
    #[error("`{0}` takes no arguments")]
    UnexpectedArguments(String),
}

const RECORD_FIELDS: usize = 5;

impl Command {
    /// Parse one input line.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ParseError::Empty);
        }
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_ascii_lowercase().as_str() {
            "insert" => parse_product(rest).map(Command::Insert),
            "edit" => parse_product(rest).map(Command::Edit),
            "search" => parse_id(rest).map(Command::Search),
            "delete" => parse_id(rest).map(Command::Delete),
            "list" => no_arguments(verb, rest, Command::List),
            "help" => no_arguments(verb, rest, Command::Help),
            "quit" | "exit" => no_arguments(verb, rest, Command::Quit),
            _ => Err(ParseError::UnknownCommand(verb.to_string())),
        }
    }
}

fn no_arguments(verb: &str, rest: &str, command: Command) -> Result<Command, ParseError> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(ParseError::UnexpectedArguments(verb.to_string()))
    }
}

fn parse_id(rest: &str) -> Result<String, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::EmptyId);
    }
    Ok(rest.to_string())
}

fn parse_product(rest: &str) -> Result<Product, ParseError> {
    let fields: Vec<&str> = rest.split('|').map(str::trim).collect();
    if fields.len() != RECORD_FIELDS {
        return Err(ParseError::FieldCount {
            expected: RECORD_FIELDS,
            found: fields.len(),
        });
    }
    let id = parse_id(fields[0])?;
    let price = fields[3]
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .ok_or_else(|| ParseError::InvalidPrice(fields[3].to_string()))?;
    let stock = fields[4]
        .parse::<i64>()
        .map_err(|_| ParseError::InvalidStock(fields[4].to_string()))?;

    Ok(Product {
        id,
        name: fields[1].to_string(),
        category: fields[2].to_string(),
        price,
        stock,
    })
}

/// What a command did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// New product stored.
    Inserted(String),
    /// Insert replaced an existing product.
    Overwritten {
        /// The record that was replaced.
        previous: Product,
    },
    /// Edit replaced an existing product.
    Updated {
        /// The record before the edit.
        previous: Product,
    },
    /// Search hit.
    Found(Product),
    /// Search, edit or delete named an id that isn't stored.
    NotFound(String),
    /// Delete hit.
    Removed(Product),
    /// Every product, in table order.
    Listing(Vec<Product>),
    /// Grammar requested.
    Help,
    /// Shell should exit.
    Quit,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Inserted(id) => write!(f, "Product {} inserted.", id),
            Outcome::Overwritten { previous } => {
                write!(f, "Product overwritten. Previous record:\n  {}", previous)
            }
            Outcome::Updated { previous } => {
                write!(f, "Product updated. Previous record:\n  {}", previous)
            }
            Outcome::Found(product) => write!(f, "Found:\n  {}", product),
            Outcome::NotFound(id) => write!(f, "Product {} not found.", id),
            Outcome::Removed(product) => write!(f, "Removed:\n  {}", product),
            Outcome::Listing(products) => {
                write!(f, "Inventory:")?;
                if products.is_empty() {
                    return write!(f, "\n  (empty)");
                }
                for product in products {
                    write!(f, "\n  - {}", product)?;
                }
                Ok(())
            }
            Outcome::Help => write!(
                f,
                "Commands:\n  \
                 insert <id> | <name> | <category> | <price> | <stock>\n  \
                 edit <id> | <name> | <category> | <price> | <stock>\n  \
                 search <id>\n  \
                 delete <id>\n  \
                 list\n  \
                 help\n  \
                 quit"
            ),
            Outcome::Quit => write!(f, "Goodbye!"),
        }
    }
}

/// A product inventory keyed by id.
pub struct Inventory {
    table: ChainedTable<Product>,
}

impl Inventory {
    /// Empty inventory.
    pub fn new() -> Self {
        Self {
            table: ChainedTable::new(INVENTORY_BUCKETS),
        }
    }

    /// Inventory preloaded with [`sample_products`].
    pub fn with_samples() -> Result<Self, chainmap::Error> {
        let mut inventory = Self::new();
        for product in sample_products() {
            inventory.table.insert(product)?;
        }
        Ok(inventory)
    }

    /// Build on an explicitly configured table.
    pub fn with_config(config: Config) -> Result<Self, chainmap::Error> {
        Ok(Self {
            table: ChainedTable::with_config(config)?,
        })
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Look a product up by id.
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.table.search(id)
    }

    /// Execute a command against the table.
    ///
    /// Only an insert of a record with an empty id can fail, and
    /// [`Command::parse`] never produces one.
    pub fn apply(&mut self, command: Command) -> Result<Outcome, chainmap::Error> {
        debug!(?command, "applying inventory command");
        let outcome = match command {
            Command::Insert(product) => {
                let id = product.id.clone();
                match self.insert(product)? {
                    Some(previous) => Outcome::Overwritten { previous },
                    None => Outcome::Inserted(id),
                }
            }
            Command::Edit(product) => {
                if !self.table.contains_key(&product.id) {
                    Outcome::NotFound(product.id)
                } else {
                    let id = product.id.clone();
                    match self.insert(product)? {
                        Some(previous) => Outcome::Updated { previous },
                        None => Outcome::Inserted(id),
                    }
                }
            }
            Command::Search(id) => match self.table.search(&id) {
                Some(product) => Outcome::Found(product.clone()),
                None => Outcome::NotFound(id),
            },
            Command::Delete(id) => match self.table.remove(&id) {
                Some(product) => Outcome::Removed(product),
                None => Outcome::NotFound(id),
            },
            Command::List => Outcome::Listing(self.table.iter().cloned().collect()),
            Command::Help => Outcome::Help,
            Command::Quit => Outcome::Quit,
        };
        Ok(outcome)
    }

    fn insert(&mut self, product: Product) -> Result<Option<Product>, chainmap::Error> {
        if self.table.policy() == InsertPolicy::Prepend {
            let previous = self.table.search(&product.id).cloned();
            self.table.insert(product)?;
            return Ok(previous);
        }
        self.table.insert(product)
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_insert() {
        let cmd = Command::parse("insert BB004 | Baby Stroller | Travel | 399.00 | 5").unwrap();
        assert_eq!(
            cmd,
            Command::Insert(Product::new("BB004", "Baby Stroller", "Travel", 399.0, 5))
        );

        let cmd = Command::parse("  EDIT BB001|Diapers L|Diapers|49.5|-2  ").unwrap();
        assert_eq!(
            cmd,
            Command::Edit(Product::new("BB001", "Diapers L", "Diapers", 49.5, -2))
        );
    }

    #[test]
    fn test_parse_simple_verbs() {
        assert_eq!(Command::parse("search BB001"), Ok(Command::Search("BB001".into())));
        assert_eq!(Command::parse("delete  BB002 "), Ok(Command::Delete("BB002".into())));
        assert_eq!(Command::parse("list"), Ok(Command::List));
        assert_eq!(Command::parse("Help"), Ok(Command::Help));
        assert_eq!(Command::parse("exit"), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Command::parse("   "), Err(ParseError::Empty));
        assert_eq!(
            Command::parse("frobnicate x"),
            Err(ParseError::UnknownCommand("frobnicate".into()))
        );
        assert_eq!(Command::parse("search"), Err(ParseError::EmptyId));
        assert_eq!(Command::parse("insert | a | b | 1 | 1"), Err(ParseError::EmptyId));
        assert_eq!(
            Command::parse("insert BB9 | a | b | 1"),
            Err(ParseError::FieldCount { expected: 5, found: 4 })
        );
        assert_eq!(
            Command::parse("insert BB9 | a | b | cheap | 1"),
            Err(ParseError::InvalidPrice("cheap".into()))
        );
        assert_eq!(
            Command::parse("insert BB9 | a | b | NaN | 1"),
            Err(ParseError::InvalidPrice("NaN".into()))
        );
        assert_eq!(
            Command::parse("insert BB9 | a | b | 1.5 | 2.5"),
            Err(ParseError::InvalidStock("2.5".into()))
        );
        assert_eq!(
            Command::parse("list everything"),
            Err(ParseError::UnexpectedArguments("list".into()))
        );
    }

    #[test]
    fn test_apply_lifecycle() {
        let mut inv = Inventory::with_samples().unwrap();
        assert_eq!(inv.len(), 3);

        let out = inv
            .apply(Command::parse("insert BB004 | Stroller | Travel | 399 | 5").unwrap())
            .unwrap();
        assert_eq!(out, Outcome::Inserted("BB004".into()));
        assert_eq!(inv.len(), 4);

        let out = inv
            .apply(Command::parse("insert BB004 | Stroller XL | Travel | 450 | 2").unwrap())
            .unwrap();
        assert!(matches!(out, Outcome::Overwritten { ref previous } if previous.name == "Stroller"));
        assert_eq!(inv.len(), 4);
        assert_eq!(inv.get("BB004").map(|p| p.stock), Some(2));

        let out = inv
            .apply(Command::parse("edit BB001 | Diapers L | Diapers | 49.90 | 80").unwrap())
            .unwrap();
        assert!(matches!(out, Outcome::Updated { ref previous } if previous.stock == 100));
        assert_eq!(inv.get("BB001").map(|p| p.stock), Some(80));

        let out = inv
            .apply(Command::parse("edit ZZ999 | x | y | 1 | 1").unwrap())
            .unwrap();
        assert_eq!(out, Outcome::NotFound("ZZ999".into()));
        assert_eq!(inv.len(), 4);

        let out = inv.apply(Command::Delete("BB002".into())).unwrap();
        assert!(matches!(out, Outcome::Removed(ref p) if p.id == "BB002"));
        assert_eq!(inv.len(), 3);

        let out = inv.apply(Command::Delete("BB002".into())).unwrap();
        assert_eq!(out, Outcome::NotFound("BB002".into()));
        assert_eq!(inv.len(), 3);

        match inv.apply(Command::List).unwrap() {
            Outcome::Listing(products) => {
                let mut ids: Vec<String> = products.into_iter().map(|p| p.id).collect();
                ids.sort();
                assert_eq!(ids, vec!["BB001", "BB003", "BB004"]);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_apply_search() {
        let mut inv = Inventory::with_samples().unwrap();
        let out = inv.apply(Command::Search("BB003".into())).unwrap();
        assert_eq!(
            out.to_string(),
            "Found:\n  [BB003] Random Feeding Bottle (Feeding) - RM59.90, Stock: 50"
        );
        let out = inv.apply(Command::Search("BB404".into())).unwrap();
        assert_eq!(out.to_string(), "Product BB404 not found.");
    }

    #[test]
    fn test_empty_listing() {
        let mut inv = Inventory::new();
        assert!(inv.is_empty());
        let out = inv.apply(Command::List).unwrap();
        assert_eq!(out.to_string(), "Inventory:\n  (empty)");
    }

    #[test]
    fn test_prepend_inventory_reports_previous() {
        let mut inv = Inventory::with_config(Config {
            bucket_count: INVENTORY_BUCKETS,
            policy: InsertPolicy::Prepend,
        })
        .unwrap();
        inv.apply(Command::Insert(Product::new("A1", "one", "c", 1.0, 1))).unwrap();
        let out = inv
            .apply(Command::Insert(Product::new("A1", "two", "c", 2.0, 2)))
            .unwrap();
        assert!(matches!(out, Outcome::Overwritten { ref previous } if previous.name == "one"));
        // Both nodes remain; the newest shadows the older one.
        assert_eq!(inv.len(), 2);
        assert_eq!(inv.get("A1").map(|p| p.name.as_str()), Some("two"));
    }
}
