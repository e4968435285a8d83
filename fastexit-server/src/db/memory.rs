//! In-process driver
//!
//! Each transaction works on a snapshot of the committed rows and records
//! its writes; commit replays the writes against the current committed
//! state, so a conflicting insert from a concurrent transaction surfaces
//! at commit time the way a unique index would.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fastexit_core::Driver;
use thiserror::Error;

use crate::error::InfraError;
use crate::tx::{Connection, Transaction, TransactionManager, TransactionMode};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("duplicate value for unique column {column}: {value}")]
    UniqueViolation { column: &'static str, value: String },

    #[error("injected {stage} failure")]
    InjectedFailure { stage: &'static str },

    #[error("memory store lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUserRow {
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Transaction counters, for asserting boundary behaviour in tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub begun: u64,
    pub committed: u64,
    pub rolled_back: u64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<i64, UserRow>>,
    last_id: AtomicI64,
    begun: AtomicU64,
    committed: AtomicU64,
    rolled_back: AtomicU64,
    fail_connect: AtomicBool,
    fail_commit: AtomicBool,
    fail_rollback: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(self: &Arc<Self>) -> Result<MemoryConnection, MemoryError> {
        if self.fail_connect.swap(false, Ordering::SeqCst) {
            return Err(MemoryError::InjectedFailure { stage: "connect" });
        }
        let snapshot = self.rows.lock().map_err(|_| MemoryError::Poisoned)?.clone();
        self.begun.fetch_add(1, Ordering::SeqCst);

        Ok(MemoryConnection {
            store: Arc::clone(self),
            working: snapshot,
            writes: Vec::new(),
        })
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            begun: self.begun.load(Ordering::SeqCst),
            committed: self.committed.load(Ordering::SeqCst),
            rolled_back: self.rolled_back.load(Ordering::SeqCst),
        }
    }

    /// Committed rows ordered by id.
    pub fn rows(&self) -> Vec<UserRow> {
        self.rows
            .lock()
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().map(|rows| rows.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make the next `begin` fail.
    pub fn fail_next_connect(&self) {
        self.fail_connect.store(true, Ordering::SeqCst);
    }

    /// Make the next commit fail; its writes are discarded.
    pub fn fail_next_commit(&self) {
        self.fail_commit.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_rollback(&self) {
        self.fail_rollback.store(true, Ordering::SeqCst);
    }

    fn next_id(&self) -> i64 {
        self.last_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn apply(&self, writes: Vec<PendingWrite>) -> Result<(), MemoryError> {
        let mut rows = self.rows.lock().map_err(|_| MemoryError::Poisoned)?;
        let mut staged = rows.clone();

        for write in writes {
            match write {
                PendingWrite::Insert(row) => {
                    check_unique(&staged, &row.username, &row.email, None)?;
                    staged.insert(row.id, row);
                }
                PendingWrite::Update(row) => {
                    if staged.contains_key(&row.id) {
                        check_unique(&staged, &row.username, &row.email, Some(row.id))?;
                        staged.insert(row.id, row);
                    }
                }
                PendingWrite::Delete(id) => {
                    staged.remove(&id);
                }
            }
        }

        *rows = staged;
        Ok(())
    }
}

enum PendingWrite {
    Insert(UserRow),
    Update(UserRow),
    Delete(i64),
}

/// One transaction's view of the store.
pub struct MemoryConnection {
    store: Arc<MemoryStore>,
    working: BTreeMap<i64, UserRow>,
    writes: Vec<PendingWrite>,
}

impl MemoryConnection {
    pub fn insert(&mut self, new: NewUserRow) -> Result<UserRow, MemoryError> {
        check_unique(&self.working, &new.username, &new.email, None)?;

        let row = UserRow {
            id: self.store.next_id(),
            username: new.username,
            email: new.email,
            full_name: new.full_name,
            created_at: new.created_at,
        };
        self.working.insert(row.id, row.clone());
        self.writes.push(PendingWrite::Insert(row.clone()));
        Ok(row)
    }

    /// Replace a row; `None` when no row has that id.
    pub fn update(&mut self, row: UserRow) -> Result<Option<UserRow>, MemoryError> {
        if !self.working.contains_key(&row.id) {
            return Ok(None);
        }
        check_unique(&self.working, &row.username, &row.email, Some(row.id))?;

        self.working.insert(row.id, row.clone());
        self.writes.push(PendingWrite::Update(row.clone()));
        Ok(Some(row))
    }

    pub fn delete(&mut self, id: i64) -> bool {
        let removed = self.working.remove(&id).is_some();
        if removed {
            self.writes.push(PendingWrite::Delete(id));
        }
        removed
    }

    pub fn get(&self, id: i64) -> Option<&UserRow> {
        self.working.get(&id)
    }

    /// Rows ordered by id, plus the total row count.
    pub fn page(&self, skip: u64, limit: u64) -> (Vec<UserRow>, i64) {
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let items = self.working.values().skip(skip).take(limit).cloned().collect();
        (items, self.working.len() as i64)
    }

    pub fn username_taken(&self, username: &str) -> bool {
        self.working.values().any(|row| row.username == username)
    }

    pub fn email_taken(&self, email: &str) -> bool {
        self.working.values().any(|row| row.email == email)
    }

    pub(crate) fn commit(self) -> Result<(), MemoryError> {
        if self.store.fail_commit.swap(false, Ordering::SeqCst) {
            return Err(MemoryError::InjectedFailure { stage: "commit" });
        }
        self.store.apply(self.writes)?;
        self.store.committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub(crate) fn rollback(self) -> Result<(), MemoryError> {
        if self.store.fail_rollback.swap(false, Ordering::SeqCst) {
            return Err(MemoryError::InjectedFailure { stage: "rollback" });
        }
        self.store.rolled_back.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn check_unique(
    rows: &BTreeMap<i64, UserRow>,
    username: &str,
    email: &str,
    except: Option<i64>,
) -> Result<(), MemoryError> {
    for row in rows.values().filter(|row| Some(row.id) != except) {
        if row.username == username {
            return Err(MemoryError::UniqueViolation {
                column: "username",
                value: username.to_owned(),
            });
        }
        if row.email == email {
            return Err(MemoryError::UniqueViolation {
                column: "email",
                value: email.to_owned(),
            });
        }
    }
    Ok(())
}

/// Hands out [`MemoryConnection`]s wrapped in transactions.
///
/// There is no replica; both modes read the same store.
#[derive(Debug, Clone)]
pub struct MemoryTransactionManager {
    store: Arc<MemoryStore>,
}

impl MemoryTransactionManager {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    fn begin(&self, mode: TransactionMode) -> Result<Transaction, InfraError> {
        let connection = self
            .store
            .begin()
            .map_err(|e| InfraError::ConnectionFailed {
                mode,
                source: e.into(),
            })?;
        Ok(Transaction::new(mode, Connection::Memory(connection)))
    }
}

#[async_trait]
impl TransactionManager for MemoryTransactionManager {
    fn driver(&self) -> Driver {
        Driver::Memory
    }

    async fn create_readonly_transaction(&self) -> Result<Transaction, InfraError> {
        self.begin(TransactionMode::Readonly)
    }

    async fn create_writable_transaction(&self) -> Result<Transaction, InfraError> {
        self.begin(TransactionMode::Writable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_row(name: &str) -> NewUserRow {
        NewUserRow {
            username: name.to_owned(),
            email: format!("{name}@example.com"),
            full_name: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn writes_invisible_until_commit() {
        let store = Arc::new(MemoryStore::new());
        let mut conn = store.begin().unwrap();
        conn.insert(new_row("alice")).unwrap();

        let other = store.begin().unwrap();
        assert!(!other.username_taken("alice"));
        assert!(store.is_empty());

        conn.commit().unwrap();
        assert_eq!(store.rows()[0].username, "alice");
    }

    #[test]
    fn rejects_duplicates_in_working_copy() {
        let store = Arc::new(MemoryStore::new());
        let mut conn = store.begin().unwrap();
        conn.insert(new_row("alice")).unwrap();

        let mut dup = new_row("alice2");
        dup.email = "alice@example.com".into();
        assert_eq!(
            conn.insert(dup).unwrap_err(),
            MemoryError::UniqueViolation {
                column: "email",
                value: "alice@example.com".into()
            }
        );
    }

    #[test]
    fn conflicting_commit_fails() {
        let store = Arc::new(MemoryStore::new());
        let mut first = store.begin().unwrap();
        let mut second = store.begin().unwrap();
        first.insert(new_row("alice")).unwrap();
        second.insert(new_row("alice")).unwrap();

        first.commit().unwrap();
        assert!(matches!(
            second.commit(),
            Err(MemoryError::UniqueViolation { column: "username", .. })
        ));
        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().committed, 1);
    }

    #[test]
    fn page_orders_by_id() {
        let store = Arc::new(MemoryStore::new());
        let mut conn = store.begin().unwrap();
        for name in ["carol", "alice", "bob"] {
            conn.insert(new_row(name)).unwrap();
        }

        let (items, total) = conn.page(1, 5);
        assert_eq!(total, 3);
        let names: Vec<_> = items.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, ["alice", "bob"]);
    }

    #[test]
    fn update_and_delete() {
        let store = Arc::new(MemoryStore::new());
        let mut conn = store.begin().unwrap();
        let mut row = conn.insert(new_row("alice")).unwrap();

        row.full_name = Some("Alice".into());
        assert!(conn.update(row.clone()).unwrap().is_some());
        assert_eq!(conn.get(row.id).unwrap().full_name.as_deref(), Some("Alice"));

        assert!(conn.delete(row.id));
        assert!(!conn.delete(row.id));
        assert!(conn.update(row).unwrap().is_none());
    }

    #[test]
    fn injected_failures_fire_once() {
        let store = Arc::new(MemoryStore::new());
        store.fail_next_connect();
        assert!(store.begin().is_err());
        assert!(store.begin().is_ok());

        store.fail_next_rollback();
        assert!(store.begin().unwrap().rollback().is_err());
        assert!(store.begin().unwrap().rollback().is_ok());
        assert_eq!(store.stats().rolled_back, 1);
    }
}
