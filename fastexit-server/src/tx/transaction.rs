//! A single database transaction and its commit/rollback contract.

use std::fmt;
use std::future::Future;

use fastexit_core::Driver;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use uuid::Uuid;

use super::Connection;
use crate::error::InfraError;

/// Which connection target a transaction was opened against.
///
/// A hint for picking the read or write target, not enforced once the
/// transaction exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionMode {
    Readonly,
    Writable,
}

impl TransactionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Readonly => "readonly",
            Self::Writable => "writable",
        }
    }
}

impl fmt::Display for TransactionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owns exactly one [`Connection`] until it is committed or rolled back.
///
/// Finishing takes the connection out, so a finished transaction cannot
/// be used again; every later access fails with
/// [`InfraError::TransactionFinished`].
pub struct Transaction {
    id: Uuid,
    mode: TransactionMode,
    driver: Driver,
    connection: Mutex<Option<Connection>>,
}

impl Transaction {
    pub fn new(mode: TransactionMode, connection: Connection) -> Self {
        let id = Uuid::new_v4();
        let driver = connection.driver();
        tracing::debug!(tx_id = %id, %mode, %driver, "transaction begun");

        Self {
            id,
            mode,
            driver,
            connection: Mutex::new(Some(connection)),
        }
    }

    /// Diagnostic id, attached to every log line about this transaction.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    /// Borrow the connection for one or more statements.
    ///
    /// Holds the transaction's lock until the guard is dropped, so keep
    /// the guard inside a single repository call.
    pub async fn connection(&self) -> Result<MappedMutexGuard<'_, Connection>, InfraError> {
        let guard = self.connection.lock().await;
        MutexGuard::try_map(guard, Option::as_mut)
            .map_err(|_| InfraError::TransactionFinished { id: self.id })
    }

    pub async fn is_finished(&self) -> bool {
        self.connection.lock().await.is_none()
    }

    /// Persist everything done through this transaction.
    pub async fn commit(&self) -> Result<(), InfraError> {
        let connection = self.take().await?;
        match connection.commit().await {
            Ok(()) => {
                tracing::debug!(tx_id = %self.id, mode = %self.mode, "transaction committed");
                Ok(())
            }
            Err(source) => {
                tracing::error!(tx_id = %self.id, error = %source, "commit failed");
                Err(InfraError::CommitFailed { source })
            }
        }
    }

    /// Discard everything done through this transaction.
    pub async fn rollback(&self) -> Result<(), InfraError> {
        let connection = self.take().await?;
        match connection.rollback().await {
            Ok(()) => {
                tracing::debug!(tx_id = %self.id, mode = %self.mode, "transaction rolled back");
                Ok(())
            }
            Err(source) => {
                tracing::error!(tx_id = %self.id, error = %source, "rollback failed");
                Err(InfraError::RollbackFailed { source })
            }
        }
    }

    /// Commit on `Ok`, roll back on `Err`.
    ///
    /// A failed rollback is returned in place of the original error; the
    /// original is logged so it is not lost entirely.
    pub async fn finish<T, E>(&self, result: Result<T, E>) -> Result<T, E>
    where
        E: From<InfraError> + fmt::Display,
    {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => match self.rollback().await {
                Ok(()) => Err(err),
                Err(rollback_err) => {
                    tracing::error!(
                        tx_id = %self.id,
                        masked_error = %err,
                        "rollback failed, reporting it instead of the original error"
                    );
                    Err(rollback_err.into())
                }
            },
        }
    }

    /// Run `body` and finish the transaction with its result.
    ///
    /// If the returned future is dropped before completion the transaction
    /// stays unfinished and the driver rolls it back when the last handle
    /// goes away.
    pub async fn scope<T, E, F>(&self, body: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<InfraError> + fmt::Display,
    {
        let result = body.await;
        self.finish(result).await
    }

    async fn take(&self) -> Result<Connection, InfraError> {
        self.connection
            .lock()
            .await
            .take()
            .ok_or(InfraError::TransactionFinished { id: self.id })
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("driver", &self.driver)
            .finish_non_exhaustive()
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.connection.get_mut().is_some() {
            tracing::warn!(
                tx_id = %self.id,
                mode = %self.mode,
                "transaction dropped unfinished, driver will roll it back"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{MemoryStore, NewUserRow};
    use chrono::Utc;
    use std::sync::Arc;

    fn begin(store: &Arc<MemoryStore>, mode: TransactionMode) -> Transaction {
        Transaction::new(mode, Connection::Memory(store.begin().unwrap()))
    }

    fn row(name: &str) -> NewUserRow {
        NewUserRow {
            username: name.to_owned(),
            email: format!("{name}@example.com"),
            full_name: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn commit_persists_and_finishes() {
        let store = Arc::new(MemoryStore::new());
        let tx = begin(&store, TransactionMode::Writable);

        tx.connection().await.unwrap().as_memory().unwrap().insert(row("alice")).unwrap();
        tx.commit().await.unwrap();

        assert!(tx.is_finished().await);
        assert_eq!(store.len(), 1);
        assert!(matches!(
            tx.connection().await,
            Err(InfraError::TransactionFinished { .. })
        ));
        assert!(matches!(
            tx.commit().await,
            Err(InfraError::TransactionFinished { .. })
        ));
    }

    #[tokio::test]
    async fn finish_rolls_back_on_error() {
        let store = Arc::new(MemoryStore::new());
        let tx = begin(&store, TransactionMode::Writable);

        tx.connection().await.unwrap().as_memory().unwrap().insert(row("bob")).unwrap();
        let result: Result<(), InfraError> = tx
            .finish(Err(InfraError::misconfigured("business failure")))
            .await;

        assert!(matches!(result, Err(InfraError::Misconfigured { .. })));
        assert!(store.is_empty());
        assert_eq!(store.stats().rolled_back, 1);
    }

    #[tokio::test]
    async fn rollback_failure_supersedes_original_error() {
        let store = Arc::new(MemoryStore::new());
        let tx = begin(&store, TransactionMode::Writable);
        store.fail_next_rollback();

        let result: Result<(), InfraError> = tx
            .finish(Err(InfraError::misconfigured("business failure")))
            .await;

        assert!(matches!(result, Err(InfraError::RollbackFailed { .. })));
        assert!(tx.is_finished().await);
    }

    #[tokio::test]
    async fn commit_failure_is_surfaced() {
        let store = Arc::new(MemoryStore::new());
        let tx = begin(&store, TransactionMode::Writable);
        tx.connection().await.unwrap().as_memory().unwrap().insert(row("carol")).unwrap();
        store.fail_next_commit();

        let result = tx.scope(async { Ok::<_, InfraError>(42) }).await;

        assert!(matches!(result, Err(InfraError::CommitFailed { .. })));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn dropping_unfinished_discards_writes() {
        let store = Arc::new(MemoryStore::new());
        {
            let tx = begin(&store, TransactionMode::Writable);
            tx.connection().await.unwrap().as_memory().unwrap().insert(row("dave")).unwrap();
        }
        assert!(store.is_empty());
    }

    #[test]
    fn mode_display() {
        assert_eq!(TransactionMode::Readonly.to_string(), "readonly");
        assert_eq!(TransactionMode::Writable.to_string(), "writable");
    }
}
