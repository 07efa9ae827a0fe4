//! Records stored in the catalog.
//!
//! [`Product`] is the full inventory record. [`Item`] is the slim record the
//! lookup benchmark uses, where only the id matters.

use std::fmt;

use chainmap::Record;

/// A shop product keyed by its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Unique key, e.g. `BB001`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-form category.
    pub category: String,
    /// Unit price in ringgit.
    pub price: f64,
    /// Units on hand. May go negative on backorder.
    pub stock: i64,
}

impl Product {
    /// Build a product from borrowed fields.
    pub fn new(id: &str, name: &str, category: &str, price: f64, stock: i64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            price,
            stock,
        }
    }
}

impl Record for Product {
    fn key(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}) - RM{:.2}, Stock: {}",
            self.id, self.name, self.category, self.price, self.stock
        )
    }
}

/// The products an empty shop starts with.
pub fn sample_products() -> Vec<Product> {
    vec![
        Product::new("BB001", "Random Diapers M-Size", "Diapers", 45.90, 100),
        Product::new("BB002", "Random Baby Wipes", "Baby Care", 12.50, 200),
        Product::new("BB003", "Random Feeding Bottle", "Feeding", 59.90, 50),
    ]
}

/// Benchmark record: an id and a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// `P` followed by the zero-padded index.
    pub id: String,
    /// Descriptive payload.
    pub name: String,
}

impl Record for Item {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Id of the `index`-th benchmark item: `P000000`, `P000001`, ...
///
/// Indices past 999999 widen the id rather than wrapping.
pub fn item_id(index: usize) -> String {
    format!("P{:06}", index)
}

/// `n` items with sequential ids `P000000 .. P(n-1)`.
pub fn dataset(n: usize) -> Vec<Item> {
    (0..n)
        .map(|i| Item {
            id: item_id(i),
            name: format!("Product #{}", i),
        })
        .collect()
}
