use async_trait::async_trait;
use fastexit_core::Driver;

use super::{Transaction, TransactionMode};
use crate::error::InfraError;

/// Factory for transactions on a concrete driver.
///
/// Readonly transactions come from the read target and writable ones
/// from the write target; with no replica configured both are the same.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    fn driver(&self) -> Driver;

    async fn create_readonly_transaction(&self) -> Result<Transaction, InfraError>;

    async fn create_writable_transaction(&self) -> Result<Transaction, InfraError>;

    async fn create_transaction(&self, mode: TransactionMode) -> Result<Transaction, InfraError> {
        match mode {
            TransactionMode::Readonly => self.create_readonly_transaction().await,
            TransactionMode::Writable => self.create_writable_transaction().await,
        }
    }
}
