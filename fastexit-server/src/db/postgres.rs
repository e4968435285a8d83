//! Raw SQL driver over sqlx.

use async_trait::async_trait;
use fastexit_core::Driver;
use sqlx::PgPool;

use crate::error::InfraError;
use crate::tx::{Connection, Transaction, TransactionManager, TransactionMode};

#[derive(Debug, Clone)]
pub struct PgTransactionManager {
    write: PgPool,
    read: PgPool,
}

impl PgTransactionManager {
    pub fn new(write: PgPool, read: PgPool) -> Self {
        Self { write, read }
    }

    async fn begin(&self, mode: TransactionMode) -> Result<Transaction, InfraError> {
        let pool = match mode {
            TransactionMode::Readonly => &self.read,
            TransactionMode::Writable => &self.write,
        };
        let tx = pool.begin().await.map_err(|e| {
            tracing::error!(%mode, error = %e, "failed to begin transaction");
            InfraError::ConnectionFailed {
                mode,
                source: e.into(),
            }
        })?;
        Ok(Transaction::new(mode, Connection::Postgres(tx)))
    }
}

#[async_trait]
impl TransactionManager for PgTransactionManager {
    fn driver(&self) -> Driver {
        Driver::Sqlx
    }

    async fn create_readonly_transaction(&self) -> Result<Transaction, InfraError> {
        self.begin(TransactionMode::Readonly).await
    }

    async fn create_writable_transaction(&self) -> Result<Transaction, InfraError> {
        self.begin(TransactionMode::Writable).await
    }
}
