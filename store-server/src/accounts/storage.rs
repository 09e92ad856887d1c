//! redb-based storage for user accounts
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `accounts` | `user_id` | `Account` | Identity, balance, favorites |
//!
//! Balance mutations go through [`AccountStorage::credit`] and
//! [`AccountStorage::debit`] only. The debit is conditional on
//! `balance >= amount` and runs inside a single write transaction, so two
//! concurrent debits cannot drive a balance negative.

use crate::db::{self, StorageResult};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Table for account records: key = user_id, value = JSON-serialized Account
const ACCOUNTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("accounts");

/// Stored account record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub user_id: String,
    /// argon2 PHC string
    pub password_hash: String,
    pub balance: Decimal,
    /// Unix millis
    pub created_at: i64,
    /// Collected (favorited) book ids
    #[serde(default)]
    pub book_collection: Vec<String>,
    /// Collected (favorited) store ids
    #[serde(default)]
    pub store_collection: Vec<String>,
}

impl Account {
    /// Verify password using argon2
    pub fn verify_password(&self, password: &str) -> Result<bool, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHash, PasswordVerifier},
        };

        let parsed_hash = PasswordHash::new(&self.password_hash)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash password using argon2
    pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
        Ok(password_hash.to_string())
    }
}

/// Outcome of a conditional debit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    /// Balance was reduced by the requested amount
    Applied,
    /// No such account
    Missing,
    /// Balance below the requested amount; nothing changed
    Insufficient,
}

/// Account storage backed by redb
#[derive(Clone)]
pub struct AccountStorage {
    db: Arc<Database>,
}

impl AccountStorage {
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
            let _ = write_txn.open_table(ACCOUNTS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Load an account
    pub fn get(&self, user_id: &str) -> StorageResult<Option<Account>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACCOUNTS_TABLE)?;
        match table.get(user_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Whether the account exists
    pub fn exists(&self, user_id: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACCOUNTS_TABLE)?;
        Ok(table.get(user_id)?.is_some())
    }

    /// Insert a new account; returns false if the user id is already taken
    pub fn try_insert(&self, account: &Account) -> StorageResult<bool> {
        let write_txn = self.db.begin_write()?;
        let inserted = {
            let mut table = write_txn.open_table(ACCOUNTS_TABLE)?;
            if table.get(account.user_id.as_str())?.is_some() {
                false
            } else {
                let value = serde_json::to_vec(account)?;
                table.insert(account.user_id.as_str(), value.as_slice())?;
                true
            }
        };
        if inserted {
            write_txn.commit()?;
        }
        Ok(inserted)
    }

    /// Remove an account; returns false if it did not exist
    pub fn remove(&self, user_id: &str) -> StorageResult<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(ACCOUNTS_TABLE)?;
            table.remove(user_id)?.is_some()
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Mutate an account in place within one write transaction
    ///
    /// Returns false if the account does not exist. The closure runs while
    /// the write lock is held, so the read-modify-write is atomic.
    pub fn update(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut Account),
    ) -> StorageResult<bool> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(ACCOUNTS_TABLE)?;
            let mut account: Account = match table.get(user_id)? {
                Some(guard) => serde_json::from_slice(guard.value())?,
                None => return Ok(false),
            };
            f(&mut account);
            let value = serde_json::to_vec(&account)?;
            table.insert(user_id, value.as_slice())?;
            true
        };
        write_txn.commit()?;
        Ok(updated)
    }

    /// Unconditional balance credit; returns false if the account is missing
    pub fn credit(&self, user_id: &str, amount: Decimal) -> StorageResult<bool> {
        self.update(user_id, |account| account.balance += amount)
    }

    /// Conditional balance debit, applied only if `balance >= amount`
    pub fn debit(&self, user_id: &str, amount: Decimal) -> StorageResult<DebitOutcome> {
        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut table = write_txn.open_table(ACCOUNTS_TABLE)?;
            let mut account: Account = match table.get(user_id)? {
                Some(guard) => serde_json::from_slice(guard.value())?,
                None => return Ok(DebitOutcome::Missing),
            };
            if account.balance < amount {
                return Ok(DebitOutcome::Insufficient);
            }
            account.balance -= amount;
            let value = serde_json::to_vec(&account)?;
            table.insert(user_id, value.as_slice())?;
            DebitOutcome::Applied
        };
        write_txn.commit()?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(user_id: &str, balance: i64) -> Account {
        Account {
            user_id: user_id.to_string(),
            password_hash: Account::hash_password("pw").unwrap(),
            balance: Decimal::from(balance),
            created_at: shared::util::now_millis(),
            book_collection: vec![],
            store_collection: vec![],
        }
    }

    #[test]
    fn test_insert_and_get() {
        let storage = AccountStorage::open_in_memory().unwrap();
        assert!(storage.try_insert(&account("u1", 0)).unwrap());
        assert!(!storage.try_insert(&account("u1", 0)).unwrap());

        let loaded = storage.get("u1").unwrap().unwrap();
        assert_eq!(loaded.user_id, "u1");
        assert_eq!(loaded.balance, Decimal::ZERO);
        assert!(storage.get("u2").unwrap().is_none());
    }

    #[test]
    fn test_password_roundtrip() {
        let acc = account("u1", 0);
        assert!(acc.verify_password("pw").unwrap());
        assert!(!acc.verify_password("wrong").unwrap());
    }

    #[test]
    fn test_credit_and_debit() {
        let storage = AccountStorage::open_in_memory().unwrap();
        storage.try_insert(&account("u1", 0)).unwrap();

        assert!(storage.credit("u1", Decimal::from(100)).unwrap());
        assert_eq!(
            storage.debit("u1", Decimal::from(30)).unwrap(),
            DebitOutcome::Applied
        );
        assert_eq!(storage.get("u1").unwrap().unwrap().balance, Decimal::from(70));
    }

    #[test]
    fn test_debit_insufficient_leaves_balance_unchanged() {
        let storage = AccountStorage::open_in_memory().unwrap();
        storage.try_insert(&account("u1", 50)).unwrap();

        assert_eq!(
            storage.debit("u1", Decimal::from(51)).unwrap(),
            DebitOutcome::Insufficient
        );
        assert_eq!(storage.get("u1").unwrap().unwrap().balance, Decimal::from(50));
    }

    #[test]
    fn test_debit_missing_account() {
        let storage = AccountStorage::open_in_memory().unwrap();
        assert_eq!(
            storage.debit("ghost", Decimal::ONE).unwrap(),
            DebitOutcome::Missing
        );
        assert!(!storage.credit("ghost", Decimal::ONE).unwrap());
    }

    #[test]
    fn test_concurrent_debits_never_go_negative() {
        let storage = AccountStorage::open_in_memory().unwrap();
        storage.try_insert(&account("u1", 100)).unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let storage = storage.clone();
            handles.push(std::thread::spawn(move || {
                let mut applied = 0;
                for _ in 0..5 {
                    if storage.debit("u1", Decimal::from(10)).unwrap() == DebitOutcome::Applied {
                        applied += 1;
                    }
                }
                applied
            }));
        }
        let total: i32 = handles.into_iter().map(|h| h.join().unwrap()).sum();

        // 100 in the account, 10 per debit: exactly 10 debits can succeed
        assert_eq!(total, 10);
        assert_eq!(storage.get("u1").unwrap().unwrap().balance, Decimal::ZERO);
    }
}
