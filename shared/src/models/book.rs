//! Book metadata model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Book metadata as listed in a store's catalog
///
/// `price` is the unit price used to snapshot order line prices at
/// order-creation time; later catalog edits do not affect existing orders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookInfo {
    /// Global book identifier (e.g. ISBN)
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub publisher: String,
    /// Unit price
    pub price: Decimal,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{"id": "b1", "title": "Dune", "price": 10.5}"#;
        let book: BookInfo = serde_json::from_str(json).unwrap();
        assert_eq!(book.id, "b1");
        assert_eq!(book.author, "");
        assert!(book.tags.is_empty());
        assert_eq!(book.price, Decimal::new(105, 1));
    }
}
