//! Account service - identity, authentication, and ledger operations
//!
//! The password check deliberately returns the same error for "unknown
//! user" and "wrong password" so callers cannot probe which user ids exist.

use super::storage::{Account, AccountStorage, DebitOutcome};
use rust_decimal::Decimal;
use shared::{AppError, AppResult};
use std::path::Path;

/// User account collaborator consumed by the order engine
#[derive(Clone)]
pub struct AccountService {
    storage: AccountStorage,
}

impl AccountService {
    /// Open or create the account database at the given path
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let storage = AccountStorage::open(path)?;
        Ok(Self { storage })
    }

    /// In-memory service (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> AppResult<Self> {
        let storage = AccountStorage::open_in_memory()?;
        Ok(Self { storage })
    }

    // ==================== Identity ====================

    /// Register a new user with a zero balance
    pub fn register(&self, user_id: &str, password: &str) -> AppResult<()> {
        let account = Account {
            user_id: user_id.to_string(),
            password_hash: Account::hash_password(password)
                .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))?,
            balance: Decimal::ZERO,
            created_at: shared::util::now_millis(),
            book_collection: Vec::new(),
            store_collection: Vec::new(),
        };
        if !self.storage.try_insert(&account)? {
            return Err(AppError::user_already_exists(user_id));
        }
        tracing::info!(user_id = %user_id, "User registered");
        Ok(())
    }

    /// Whether the user exists
    pub fn exists(&self, user_id: &str) -> AppResult<bool> {
        Ok(self.storage.exists(user_id)?)
    }

    /// Verify the user's password
    pub fn authenticate(&self, user_id: &str, password: &str) -> AppResult<()> {
        let Some(account) = self.storage.get(user_id)? else {
            return Err(AppError::authorization_failed());
        };
        if !account.verify_password(password).unwrap_or(false) {
            return Err(AppError::authorization_failed());
        }
        Ok(())
    }

    /// Change the user's password (old password required)
    pub fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        self.authenticate(user_id, old_password)?;
        let hash = Account::hash_password(new_password)
            .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))?;
        if !self.storage.update(user_id, |account| account.password_hash = hash)? {
            return Err(AppError::authorization_failed());
        }
        Ok(())
    }

    /// Delete the account (password required)
    pub fn unregister(&self, user_id: &str, password: &str) -> AppResult<()> {
        self.authenticate(user_id, password)?;
        if !self.storage.remove(user_id)? {
            return Err(AppError::authorization_failed());
        }
        tracing::info!(user_id = %user_id, "User unregistered");
        Ok(())
    }

    // ==================== Ledger ====================

    /// Current balance
    pub fn balance(&self, user_id: &str) -> AppResult<Decimal> {
        match self.storage.get(user_id)? {
            Some(account) => Ok(account.balance),
            None => Err(AppError::user_not_found(user_id)),
        }
    }

    /// Buyer-facing top-up; requires the password and a positive amount
    pub fn deposit(&self, user_id: &str, password: &str, amount: Decimal) -> AppResult<()> {
        if amount <= Decimal::ZERO {
            return Err(AppError::validation("deposit amount must be positive"));
        }
        self.authenticate(user_id, password)?;
        self.credit(user_id, amount)
    }

    /// Unconditional credit (used for deposits, seller payouts, refunds)
    pub fn credit(&self, user_id: &str, amount: Decimal) -> AppResult<()> {
        if !self.storage.credit(user_id, amount)? {
            return Err(AppError::user_not_found(user_id));
        }
        Ok(())
    }

    /// Conditional debit, succeeds only if `balance >= amount`
    pub fn debit(&self, user_id: &str, amount: Decimal) -> AppResult<()> {
        match self.storage.debit(user_id, amount)? {
            DebitOutcome::Applied => Ok(()),
            DebitOutcome::Missing => Err(AppError::user_not_found(user_id)),
            DebitOutcome::Insufficient => {
                Err(AppError::new(shared::ErrorCode::InsufficientFunds))
            }
        }
    }

    // ==================== Favorites ====================

    /// Add a book to the user's collection; already-collected is a no-op
    pub fn collect_book(&self, user_id: &str, book_id: &str) -> AppResult<()> {
        let updated = self.storage.update(user_id, |account| {
            if !account.book_collection.iter().any(|b| b == book_id) {
                account.book_collection.push(book_id.to_string());
            }
        })?;
        if !updated {
            return Err(AppError::user_not_found(user_id));
        }
        Ok(())
    }

    /// Remove a book from the user's collection
    pub fn uncollect_book(&self, user_id: &str, book_id: &str) -> AppResult<()> {
        let updated = self
            .storage
            .update(user_id, |account| account.book_collection.retain(|b| b != book_id))?;
        if !updated {
            return Err(AppError::user_not_found(user_id));
        }
        Ok(())
    }

    /// The user's collected book ids
    pub fn book_collection(&self, user_id: &str) -> AppResult<Vec<String>> {
        match self.storage.get(user_id)? {
            Some(account) => Ok(account.book_collection),
            None => Err(AppError::user_not_found(user_id)),
        }
    }

    /// Add a store to the user's collection; already-collected is a no-op
    pub fn collect_store(&self, user_id: &str, store_id: &str) -> AppResult<()> {
        let updated = self.storage.update(user_id, |account| {
            if !account.store_collection.iter().any(|s| s == store_id) {
                account.store_collection.push(store_id.to_string());
            }
        })?;
        if !updated {
            return Err(AppError::user_not_found(user_id));
        }
        Ok(())
    }

    /// Remove a store from the user's collection
    pub fn uncollect_store(&self, user_id: &str, store_id: &str) -> AppResult<()> {
        let updated = self
            .storage
            .update(user_id, |account| account.store_collection.retain(|s| s != store_id))?;
        if !updated {
            return Err(AppError::user_not_found(user_id));
        }
        Ok(())
    }

    /// The user's collected store ids
    pub fn store_collection(&self, user_id: &str) -> AppResult<Vec<String>> {
        match self.storage.get(user_id)? {
            Some(account) => Ok(account.store_collection),
            None => Err(AppError::user_not_found(user_id)),
        }
    }
}
