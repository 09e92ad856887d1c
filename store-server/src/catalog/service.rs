//! Catalog service - seller-facing store and listing management, plus the
//! inventory operations the order engine consumes

use super::storage::{CatalogStorage, InventoryItem, StockOutcome, StoreRecord};
use crate::accounts::AccountService;
use shared::{AppError, AppResult, BookInfo};
use std::path::Path;
use std::sync::Arc;

/// Store/inventory collaborator consumed by the order engine
#[derive(Clone)]
pub struct CatalogService {
    storage: CatalogStorage,
    accounts: Arc<AccountService>,
}

impl CatalogService {
    /// Open or create the catalog database at the given path
    pub fn open(path: impl AsRef<Path>, accounts: Arc<AccountService>) -> AppResult<Self> {
        let storage = CatalogStorage::open(path)?;
        Ok(Self { storage, accounts })
    }

    /// In-memory service (for testing)
    #[cfg(test)]
    pub fn open_in_memory(accounts: Arc<AccountService>) -> AppResult<Self> {
        let storage = CatalogStorage::open_in_memory()?;
        Ok(Self { storage, accounts })
    }

    // ==================== Stores ====================

    /// Open a new store owned by `user_id`
    pub fn create_store(&self, user_id: &str, store_id: &str) -> AppResult<()> {
        if !self.accounts.exists(user_id)? {
            return Err(AppError::user_not_found(user_id));
        }
        let store = StoreRecord {
            store_id: store_id.to_string(),
            owner: user_id.to_string(),
            created_at: shared::util::now_millis(),
        };
        if !self.storage.try_insert_store(&store)? {
            return Err(AppError::store_already_exists(store_id));
        }
        tracing::info!(store_id = %store_id, owner = %user_id, "Store created");
        Ok(())
    }

    /// Whether the store exists
    pub fn store_exists(&self, store_id: &str) -> AppResult<bool> {
        Ok(self.storage.get_store(store_id)?.is_some())
    }

    /// The user owning the store
    pub fn owner_of_store(&self, store_id: &str) -> AppResult<String> {
        match self.storage.get_store(store_id)? {
            Some(store) => Ok(store.owner),
            None => Err(AppError::store_not_found(store_id)),
        }
    }

    // ==================== Listings ====================

    /// List a book in a store with an initial stock level
    pub fn add_book(
        &self,
        user_id: &str,
        store_id: &str,
        info: BookInfo,
        stock_level: u32,
    ) -> AppResult<()> {
        if !self.accounts.exists(user_id)? {
            return Err(AppError::user_not_found(user_id));
        }
        if !self.store_exists(store_id)? {
            return Err(AppError::store_not_found(store_id));
        }
        let now = shared::util::now_millis();
        let item = InventoryItem {
            store_id: store_id.to_string(),
            book_id: info.id.clone(),
            info,
            stock_level,
            created_at: now,
            updated_at: now,
        };
        let book_id = item.book_id.clone();
        if !self.storage.try_insert_item(&item)? {
            return Err(AppError::book_already_exists(&book_id));
        }
        Ok(())
    }

    /// Whether the book is listed in the store
    pub fn book_exists(&self, store_id: &str, book_id: &str) -> AppResult<bool> {
        Ok(self.storage.get_item(store_id, book_id)?.is_some())
    }

    /// Book metadata for a listing
    pub fn get_book(&self, store_id: &str, book_id: &str) -> AppResult<BookInfo> {
        match self.storage.get_item(store_id, book_id)? {
            Some(item) => Ok(item.info),
            None => Err(AppError::book_not_found(book_id)),
        }
    }

    /// Current stock level of a listing
    pub fn stock_level(&self, store_id: &str, book_id: &str) -> AppResult<u32> {
        match self.storage.get_item(store_id, book_id)? {
            Some(item) => Ok(item.stock_level),
            None => Err(AppError::book_not_found(book_id)),
        }
    }

    /// All listings of a store
    pub fn store_inventory(&self, store_id: &str) -> AppResult<Vec<InventoryItem>> {
        if !self.store_exists(store_id)? {
            return Err(AppError::store_not_found(store_id));
        }
        Ok(self.storage.items_for_store(store_id)?)
    }

    // ==================== Stock ====================

    /// Seller-facing restock
    pub fn add_stock(
        &self,
        user_id: &str,
        store_id: &str,
        book_id: &str,
        count: u32,
    ) -> AppResult<()> {
        if count == 0 {
            return Err(AppError::validation("stock count must be positive"));
        }
        if !self.accounts.exists(user_id)? {
            return Err(AppError::user_not_found(user_id));
        }
        if !self.store_exists(store_id)? {
            return Err(AppError::store_not_found(store_id));
        }
        self.increment_stock(store_id, book_id, count)
    }

    /// Atomic conditional decrement; fails if the listing is missing or the
    /// stock level is below `count`
    pub fn decrement_stock(&self, store_id: &str, book_id: &str, count: u32) -> AppResult<()> {
        match self.storage.decrement_stock(store_id, book_id, count)? {
            StockOutcome::Applied => Ok(()),
            StockOutcome::Missing => Err(AppError::book_not_found(book_id)),
            StockOutcome::Insufficient => Err(AppError::stock_insufficient(book_id)),
        }
    }

    /// Unconditional increment, used for restock and for returning a
    /// cancelled order's reservation
    pub fn increment_stock(&self, store_id: &str, book_id: &str, count: u32) -> AppResult<()> {
        if !self.storage.increment_stock(store_id, book_id, count)? {
            return Err(AppError::book_not_found(book_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::ErrorCode;

    fn setup() -> CatalogService {
        let accounts = Arc::new(AccountService::open_in_memory().unwrap());
        accounts.register("seller", "pw").unwrap();
        CatalogService::open_in_memory(accounts).unwrap()
    }

    fn book(id: &str, price: i64) -> BookInfo {
        BookInfo {
            id: id.to_string(),
            title: format!("Book {}", id),
            author: "Author".to_string(),
            publisher: "Publisher".to_string(),
            price: Decimal::from(price),
            tags: vec!["fiction".to_string()],
        }
    }

    #[test]
    fn test_create_store() {
        let catalog = setup();
        catalog.create_store("seller", "s1").unwrap();
        assert!(catalog.store_exists("s1").unwrap());
        assert_eq!(catalog.owner_of_store("s1").unwrap(), "seller");

        let err = catalog.create_store("seller", "s1").unwrap_err();
        assert_eq!(err.code, ErrorCode::StoreAlreadyExists);

        let err = catalog.create_store("ghost", "s2").unwrap_err();
        assert_eq!(err.code, ErrorCode::UserNotFound);
    }

    #[test]
    fn test_add_book_and_lookup() {
        let catalog = setup();
        catalog.create_store("seller", "s1").unwrap();
        catalog.add_book("seller", "s1", book("b1", 10), 5).unwrap();

        assert!(catalog.book_exists("s1", "b1").unwrap());
        assert_eq!(catalog.get_book("s1", "b1").unwrap().price, Decimal::from(10));
        assert_eq!(catalog.stock_level("s1", "b1").unwrap(), 5);

        let err = catalog.add_book("seller", "s1", book("b1", 10), 5).unwrap_err();
        assert_eq!(err.code, ErrorCode::BookAlreadyExists);

        let err = catalog.add_book("seller", "nope", book("b2", 10), 5).unwrap_err();
        assert_eq!(err.code, ErrorCode::StoreNotFound);

        let err = catalog.get_book("s1", "b9").unwrap_err();
        assert_eq!(err.code, ErrorCode::BookNotFound);
    }

    #[test]
    fn test_add_stock() {
        let catalog = setup();
        catalog.create_store("seller", "s1").unwrap();
        catalog.add_book("seller", "s1", book("b1", 10), 2).unwrap();

        catalog.add_stock("seller", "s1", "b1", 3).unwrap();
        assert_eq!(catalog.stock_level("s1", "b1").unwrap(), 5);

        let err = catalog.add_stock("seller", "s1", "b1", 0).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let err = catalog.add_stock("seller", "s1", "b9", 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::BookNotFound);
    }

    #[test]
    fn test_decrement_errors() {
        let catalog = setup();
        catalog.create_store("seller", "s1").unwrap();
        catalog.add_book("seller", "s1", book("b1", 10), 2).unwrap();

        catalog.decrement_stock("s1", "b1", 2).unwrap();
        let err = catalog.decrement_stock("s1", "b1", 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::StockInsufficient);

        let err = catalog.decrement_stock("s1", "b9", 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::BookNotFound);
    }

    #[test]
    fn test_store_inventory() {
        let catalog = setup();
        catalog.create_store("seller", "s1").unwrap();
        catalog.add_book("seller", "s1", book("b1", 10), 1).unwrap();
        catalog.add_book("seller", "s1", book("b2", 20), 2).unwrap();

        let items = catalog.store_inventory("s1").unwrap();
        assert_eq!(items.len(), 2);

        let err = catalog.store_inventory("s9").unwrap_err();
        assert_eq!(err.code, ErrorCode::StoreNotFound);
    }
}
