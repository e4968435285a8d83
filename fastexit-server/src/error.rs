//! Infrastructure error types for fastexit-server
//!
//! Driver-specific errors never travel past the repository boundary on
//! their own; they are carried as the `source` of an [`InfraError`].

use thiserror::Error;

use crate::db::memory::MemoryError;
use crate::tx::TransactionMode;

/// Error raised by one of the concrete database drivers
#[derive(Error, Debug)]
pub enum DriverError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    SeaOrm(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// Technical failure: connection, transaction finalization, query, wiring.
#[derive(Error, Debug)]
pub enum InfraError {
    /// The pool could not produce a connection
    #[error("failed to acquire {mode} connection: {source}")]
    ConnectionFailed {
        mode: TransactionMode,
        #[source]
        source: DriverError,
    },

    #[error("failed to commit transaction: {source}")]
    CommitFailed {
        #[source]
        source: DriverError,
    },

    #[error("failed to roll back transaction: {source}")]
    RollbackFailed {
        #[source]
        source: DriverError,
    },

    /// Wiring problem: missing transaction manager, wrong driver, no context scope
    #[error("misconfigured: {reason}")]
    Misconfigured { reason: String },

    /// A repository method ran outside any transactional use case
    #[error("no active transaction for {operation}; run it inside a transactional use case")]
    NoActiveTransaction { operation: &'static str },

    /// The transaction was already committed or rolled back
    #[error("transaction {id} is already finished")]
    TransactionFinished { id: uuid::Uuid },

    /// A statement failed
    #[error("{operation} failed: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: DriverError,
    },

    /// A statement succeeded but produced no usable row
    #[error("{operation} failed: {reason}")]
    UnexpectedResult {
        operation: &'static str,
        reason: String,
    },
}

impl InfraError {
    /// Stable code surfaced to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConnectionFailed { .. } => "DB_CONNECTION_FAILED",
            Self::CommitFailed { .. } => "TX_COMMIT_FAILED",
            Self::RollbackFailed { .. } => "TX_ROLLBACK_FAILED",
            Self::Misconfigured { .. } => "INFRA_MISCONFIGURED",
            Self::NoActiveTransaction { .. } => "TX_NOT_ACTIVE",
            Self::TransactionFinished { .. } => "TX_FINISHED",
            Self::Query { .. } | Self::UnexpectedResult { .. } => "DB_QUERY_FAILED",
        }
    }

    /// Create a misconfiguration error
    pub fn misconfigured(reason: impl Into<String>) -> Self {
        Self::Misconfigured {
            reason: reason.into(),
        }
    }

    /// Create a query error
    pub fn query(operation: &'static str, source: impl Into<DriverError>) -> Self {
        Self::Query {
            operation,
            source: source.into(),
        }
    }
}
