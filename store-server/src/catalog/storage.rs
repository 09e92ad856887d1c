//! redb-based storage for stores and inventory
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `stores` | `store_id` | `StoreRecord` | Store ownership |
//! | `inventory` | `(store_id, book_id)` | `InventoryItem` | Listings + stock |
//!
//! The stock decrement is conditional on `stock_level >= count` and runs
//! inside a single write transaction. redb serializes writers, so two
//! concurrent decrements can never drive a stock level negative.

use crate::db::{self, StorageResult};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use shared::BookInfo;
use std::path::Path;
use std::sync::Arc;

/// Table for store records: key = store_id, value = JSON-serialized StoreRecord
const STORES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("stores");

/// Table for inventory: key = (store_id, book_id), value = JSON-serialized InventoryItem
const INVENTORY_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("inventory");

/// Store record — every store has exactly one owning user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreRecord {
    pub store_id: String,
    pub owner: String,
    /// Unix millis
    pub created_at: i64,
}

/// One book listing in one store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub store_id: String,
    pub book_id: String,
    pub info: BookInfo,
    pub stock_level: u32,
    /// Unix millis
    pub created_at: i64,
    pub updated_at: i64,
}

/// Outcome of a conditional stock decrement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockOutcome {
    /// Stock was reduced by the requested count
    Applied,
    /// No such listing
    Missing,
    /// Stock below the requested count; nothing changed
    Insufficient,
}

/// Catalog storage backed by redb
#[derive(Clone)]
pub struct CatalogStorage {
    db: Arc<Database>,
}

impl CatalogStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = db::open_file(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = db::open_in_memory()?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(STORES_TABLE)?;
            let _ = write_txn.open_table(INVENTORY_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    // ========== Stores ==========

    /// Insert a new store; returns false if the store id is already taken
    pub fn try_insert_store(&self, store: &StoreRecord) -> StorageResult<bool> {
        let write_txn = self.db.begin_write()?;
        let inserted = {
            let mut table = write_txn.open_table(STORES_TABLE)?;
            if table.get(store.store_id.as_str())?.is_some() {
                false
            } else {
                let value = serde_json::to_vec(store)?;
                table.insert(store.store_id.as_str(), value.as_slice())?;
                true
            }
        };
        if inserted {
            write_txn.commit()?;
        }
        Ok(inserted)
    }

    /// Load a store record
    pub fn get_store(&self, store_id: &str) -> StorageResult<Option<StoreRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STORES_TABLE)?;
        match table.get(store_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    // ========== Inventory ==========

    /// Insert a new listing; returns false if (store_id, book_id) exists
    pub fn try_insert_item(&self, item: &InventoryItem) -> StorageResult<bool> {
        let write_txn = self.db.begin_write()?;
        let key = (item.store_id.as_str(), item.book_id.as_str());
        let inserted = {
            let mut table = write_txn.open_table(INVENTORY_TABLE)?;
            if table.get(key)?.is_some() {
                false
            } else {
                let value = serde_json::to_vec(item)?;
                table.insert(key, value.as_slice())?;
                true
            }
        };
        if inserted {
            write_txn.commit()?;
        }
        Ok(inserted)
    }

    /// Load a listing
    pub fn get_item(&self, store_id: &str, book_id: &str) -> StorageResult<Option<InventoryItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(INVENTORY_TABLE)?;
        match table.get((store_id, book_id))? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All listings of a store
    pub fn items_for_store(&self, store_id: &str) -> StorageResult<Vec<InventoryItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(INVENTORY_TABLE)?;

        let mut items = Vec::new();
        for row in table.range((store_id, "")..)? {
            let (key, value) = row?;
            if key.value().0 != store_id {
                break;
            }
            items.push(serde_json::from_slice(value.value())?);
        }
        Ok(items)
    }

    /// Unconditional stock increment; returns false if the listing is missing
    pub fn increment_stock(&self, store_id: &str, book_id: &str, count: u32) -> StorageResult<bool> {
        let write_txn = self.db.begin_write()?;
        let key = (store_id, book_id);
        let found = {
            let mut table = write_txn.open_table(INVENTORY_TABLE)?;
            let mut item: InventoryItem = match table.get(key)? {
                Some(guard) => serde_json::from_slice(guard.value())?,
                None => return Ok(false),
            };
            item.stock_level += count;
            item.updated_at = shared::util::now_millis();
            let value = serde_json::to_vec(&item)?;
            table.insert(key, value.as_slice())?;
            true
        };
        write_txn.commit()?;
        Ok(found)
    }

    /// Conditional stock decrement, applied only if `stock_level >= count`
    pub fn decrement_stock(
        &self,
        store_id: &str,
        book_id: &str,
        count: u32,
    ) -> StorageResult<StockOutcome> {
        let write_txn = self.db.begin_write()?;
        let key = (store_id, book_id);
        let outcome = {
            let mut table = write_txn.open_table(INVENTORY_TABLE)?;
            let mut item: InventoryItem = match table.get(key)? {
                Some(guard) => serde_json::from_slice(guard.value())?,
                None => return Ok(StockOutcome::Missing),
            };
            if item.stock_level < count {
                return Ok(StockOutcome::Insufficient);
            }
            item.stock_level -= count;
            item.updated_at = shared::util::now_millis();
            let value = serde_json::to_vec(&item)?;
            table.insert(key, value.as_slice())?;
            StockOutcome::Applied
        };
        write_txn.commit()?;
        Ok(outcome)
    }
}
