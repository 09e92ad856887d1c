//! Stores, book listings, and inventory
//!
//! - **storage**: redb-backed store/inventory records with the atomic
//!   conditional stock decrement
//! - **service**: domain operations (create store, list books, restock)
//!   over the storage layer

pub mod service;
pub mod storage;

pub use service::CatalogService;
pub use storage::{CatalogStorage, InventoryItem, StockOutcome, StoreRecord};
