//! How repositories reach the active transaction.

use std::fmt;
use std::sync::Arc;

use super::{Transaction, TransactionContext, TransactionManager, TransactionMode};
use crate::error::InfraError;

/// Policy applied when a repository method finds no active transaction.
#[derive(Clone, Default)]
pub enum ConnectionAccess {
    /// Fail with [`InfraError::NoActiveTransaction`].
    #[default]
    Required,
    /// Open a single-statement unit of work and finish it before returning.
    Autocommit(Arc<dyn TransactionManager>),
}

impl fmt::Debug for ConnectionAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("Required"),
            Self::Autocommit(manager) => write!(f, "Autocommit({})", manager.driver()),
        }
    }
}

impl ConnectionAccess {
    pub async fn acquire(
        &self,
        operation: &'static str,
        mode: TransactionMode,
    ) -> Result<Acquired, InfraError> {
        if let Some(transaction) = TransactionContext::get() {
            return Ok(Acquired {
                transaction,
                owned: false,
            });
        }

        match self {
            Self::Required => {
                tracing::warn!(operation, "repository called outside a transactional use case");
                Err(InfraError::NoActiveTransaction { operation })
            }
            Self::Autocommit(manager) => {
                tracing::debug!(operation, %mode, "no active transaction, using autocommit unit");
                let transaction = manager.create_transaction(mode).await?;
                Ok(Acquired {
                    transaction: Arc::new(transaction),
                    owned: true,
                })
            }
        }
    }
}

/// A transaction lent to one repository call.
#[derive(Debug)]
pub struct Acquired {
    transaction: Arc<Transaction>,
    owned: bool,
}

impl Acquired {
    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    /// Whether this call opened the transaction itself.
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// Finish an autocommit unit; a borrowed transaction is left to its owner.
    pub async fn finish<T, E>(self, result: Result<T, E>) -> Result<T, E>
    where
        E: From<InfraError> + fmt::Display,
    {
        if self.owned {
            self.transaction.finish(result).await
        } else {
            result
        }
    }
}
