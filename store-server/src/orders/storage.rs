//! redb-based storage for in-flight orders and order history
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `OrderRecord` | In-flight orders (pending only) |
//! | `order_lines` | `(order_id, book_id)` | `OrderLine` | In-flight line items |
//! | `history` | `order_id` | `OrderHistory` | Durable status timeline |
//! | `history_lines` | `(order_id, book_id)` | `OrderLine` | Archived line items |
//! | `history_by_user` | `(user_id, order_id)` | `()` | Buyer history index |
//! | `history_by_store` | `(store_id, order_id)` | `()` | Seller history index |
//!
//! The `orders` row is the arbiter for leaving the pending state:
//! [`OrderStorage::take_order`] removes it atomically, so exactly one of
//! {payment, explicit cancel, expiry cancel} can ever claim an order. The
//! history row survives forever; its status only moves through
//! [`OrderStorage::update_history_status`], a compare-and-set.

use crate::db::{self, StorageResult};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::order::{OrderHistory, OrderLine, OrderRecord, OrderStatus};
use std::path::Path;
use std::sync::Arc;

/// Table for in-flight orders: key = order_id, value = JSON-serialized OrderRecord
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Table for in-flight line items: key = (order_id, book_id)
const ORDER_LINES_TABLE: TableDefinition<(&str, &str), &[u8]> =
    TableDefinition::new("order_lines");

/// Table for order history: key = order_id, value = JSON-serialized OrderHistory
const HISTORY_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("history");

/// Table for archived line items: key = (order_id, book_id)
const HISTORY_LINES_TABLE: TableDefinition<(&str, &str), &[u8]> =
    TableDefinition::new("history_lines");

/// Buyer history index: key = (user_id, order_id), value = empty
const HISTORY_BY_USER_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("history_by_user");

/// Seller history index: key = (store_id, order_id), value = empty
const HISTORY_BY_STORE_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("history_by_store");

/// Outcome of the history status compare-and-set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryUpdate {
    /// Status moved from the expected value to the new one
    Applied,
    /// No history entry for this order id
    Missing,
    /// Entry exists but its status differs from the expected one
    Conflict(OrderStatus),
}

/// Order storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl OrderStorage {
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
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_LINES_TABLE)?;
            let _ = write_txn.open_table(HISTORY_TABLE)?;
            let _ = write_txn.open_table(HISTORY_LINES_TABLE)?;
            let _ = write_txn.open_table(HISTORY_BY_USER_TABLE)?;
            let _ = write_txn.open_table(HISTORY_BY_STORE_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    // ========== In-flight orders ==========

    /// Persist a new order: record, line items, pending history entry, and
    /// both history indexes, all in one transaction
    pub fn insert_order(
        &self,
        record: &OrderRecord,
        lines: &[OrderLine],
        history: &OrderHistory,
    ) -> StorageResult<()> {
        let order_id = record.order_id.as_str();
        let write_txn = self.db.begin_write()?;
        {
            let mut orders = write_txn.open_table(ORDERS_TABLE)?;
            let value = serde_json::to_vec(record)?;
            orders.insert(order_id, value.as_slice())?;

            let mut order_lines = write_txn.open_table(ORDER_LINES_TABLE)?;
            let mut history_lines = write_txn.open_table(HISTORY_LINES_TABLE)?;
            for line in lines {
                let key = (order_id, line.book_id.as_str());
                let value = serde_json::to_vec(line)?;
                order_lines.insert(key, value.as_slice())?;
                history_lines.insert(key, value.as_slice())?;
            }

            let mut history_table = write_txn.open_table(HISTORY_TABLE)?;
            let value = serde_json::to_vec(history)?;
            history_table.insert(order_id, value.as_slice())?;

            let mut by_user = write_txn.open_table(HISTORY_BY_USER_TABLE)?;
            by_user.insert((record.user_id.as_str(), order_id), ())?;
            let mut by_store = write_txn.open_table(HISTORY_BY_STORE_TABLE)?;
            by_store.insert((record.store_id.as_str(), order_id), ())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Load an in-flight order record
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<OrderRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Line items of an in-flight order
    pub fn order_lines(&self, order_id: &str) -> StorageResult<Vec<OrderLine>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDER_LINES_TABLE)?;

        let mut lines = Vec::new();
        for row in table.range((order_id, "")..)? {
            let (key, value) = row?;
            if key.value().0 != order_id {
                break;
            }
            lines.push(serde_json::from_slice(value.value())?);
        }
        Ok(lines)
    }

    /// Claim an order: atomically remove its record and line items
    ///
    /// Returns `None` if the order was already claimed (paid or cancelled).
    /// This is the single arbiter for leaving the pending state — at most
    /// one caller ever gets `Some` for a given order id.
    pub fn take_order(
        &self,
        order_id: &str,
    ) -> StorageResult<Option<(OrderRecord, Vec<OrderLine>)>> {
        let write_txn = self.db.begin_write()?;
        let record: OrderRecord = {
            let mut table = write_txn.open_table(ORDERS_TABLE)?;
            match table.remove(order_id)? {
                Some(guard) => serde_json::from_slice(guard.value())?,
                None => return Ok(None),
            }
        };
        let lines = {
            let mut table = write_txn.open_table(ORDER_LINES_TABLE)?;
            let mut lines: Vec<OrderLine> = Vec::new();
            for row in table.range((order_id, "")..)? {
                let (key, value) = row?;
                if key.value().0 != order_id {
                    break;
                }
                lines.push(serde_json::from_slice(value.value())?);
            }
            for line in &lines {
                table.remove((order_id, line.book_id.as_str()))?;
            }
            lines
        };
        write_txn.commit()?;
        Ok(Some((record, lines)))
    }

    /// Ids of all in-flight orders
    pub fn active_order_ids(&self) -> StorageResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let mut ids = Vec::new();
        for row in table.iter()? {
            let (key, _) = row?;
            ids.push(key.value().to_string());
        }
        Ok(ids)
    }

    // ========== History ==========

    /// Load a history entry
    pub fn get_history(&self, order_id: &str) -> StorageResult<Option<OrderHistory>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(HISTORY_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Archived line items of an order
    pub fn history_lines(&self, order_id: &str) -> StorageResult<Vec<OrderLine>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(HISTORY_LINES_TABLE)?;

        let mut lines = Vec::new();
        for row in table.range((order_id, "")..)? {
            let (key, value) = row?;
            if key.value().0 != order_id {
                break;
            }
            lines.push(serde_json::from_slice(value.value())?);
        }
        Ok(lines)
    }

    /// Compare-and-set the history status, stamping the transition time
    ///
    /// The read-check-write runs inside one write transaction, so
    /// concurrent transitions serialize and exactly one of two racing
    /// callers observes `Applied`.
    pub fn update_history_status(
        &self,
        order_id: &str,
        expected: OrderStatus,
        next: OrderStatus,
        at: i64,
    ) -> StorageResult<HistoryUpdate> {
        debug_assert!(
            expected.can_transition_to(next),
            "illegal transition {expected:?} -> {next:?}"
        );
        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut table = write_txn.open_table(HISTORY_TABLE)?;
            let mut history: OrderHistory = match table.get(order_id)? {
                Some(guard) => serde_json::from_slice(guard.value())?,
                None => return Ok(HistoryUpdate::Missing),
            };
            if history.status != expected {
                return Ok(HistoryUpdate::Conflict(history.status));
            }
            history.apply(next, at);
            let value = serde_json::to_vec(&history)?;
            table.insert(order_id, value.as_slice())?;
            HistoryUpdate::Applied
        };
        write_txn.commit()?;
        Ok(outcome)
    }

    /// All history entries of a buyer
    pub fn history_for_user(&self, user_id: &str) -> StorageResult<Vec<OrderHistory>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(HISTORY_BY_USER_TABLE)?;
        let table = read_txn.open_table(HISTORY_TABLE)?;

        let mut entries = Vec::new();
        for row in index.range((user_id, "")..)? {
            let (key, _) = row?;
            let (uid, order_id) = key.value();
            if uid != user_id {
                break;
            }
            if let Some(guard) = table.get(order_id)? {
                entries.push(serde_json::from_slice(guard.value())?);
            }
        }
        Ok(entries)
    }

    /// All history entries of a store
    pub fn history_for_store(&self, store_id: &str) -> StorageResult<Vec<OrderHistory>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(HISTORY_BY_STORE_TABLE)?;
        let table = read_txn.open_table(HISTORY_TABLE)?;

        let mut entries = Vec::new();
        for row in index.range((store_id, "")..)? {
            let (key, _) = row?;
            let (sid, order_id) = key.value();
            if sid != store_id {
                break;
            }
            if let Some(guard) = table.get(order_id)? {
                entries.push(serde_json::from_slice(guard.value())?);
            }
        }
        Ok(entries)
    }
}
