use fastexit_core::Driver;
use sea_orm::DatabaseTransaction;
use sqlx::{PgConnection, Postgres};

use crate::db::memory::MemoryConnection;
use crate::error::{DriverError, InfraError};

/// The driver-level handle a [`Transaction`](super::Transaction) owns.
pub enum Connection {
    Postgres(sqlx::Transaction<'static, Postgres>),
    SeaOrm(DatabaseTransaction),
    Memory(MemoryConnection),
}

impl Connection {
    pub fn driver(&self) -> Driver {
        match self {
            Self::Postgres(_) => Driver::Sqlx,
            Self::SeaOrm(_) => Driver::SeaOrm,
            Self::Memory(_) => Driver::Memory,
        }
    }

    pub(crate) async fn commit(self) -> Result<(), DriverError> {
        match self {
            Self::Postgres(tx) => tx.commit().await?,
            Self::SeaOrm(tx) => tx.commit().await?,
            Self::Memory(conn) => conn.commit()?,
        }
        Ok(())
    }

    pub(crate) async fn rollback(self) -> Result<(), DriverError> {
        match self {
            Self::Postgres(tx) => tx.rollback().await?,
            Self::SeaOrm(tx) => tx.rollback().await?,
            Self::Memory(conn) => conn.rollback()?,
        }
        Ok(())
    }

    pub fn as_postgres(&mut self) -> Result<&mut PgConnection, InfraError> {
        match self {
            Self::Postgres(tx) => Ok(&mut **tx),
            other => Err(mismatch(Driver::Sqlx, other.driver())),
        }
    }

    pub fn as_sea_orm(&self) -> Result<&DatabaseTransaction, InfraError> {
        match self {
            Self::SeaOrm(tx) => Ok(tx),
            other => Err(mismatch(Driver::SeaOrm, other.driver())),
        }
    }

    pub fn as_memory(&mut self) -> Result<&mut MemoryConnection, InfraError> {
        match self {
            Self::Memory(conn) => Ok(conn),
            other => Err(mismatch(Driver::Memory, other.driver())),
        }
    }
}

fn mismatch(expected: Driver, actual: Driver) -> InfraError {
    InfraError::misconfigured(format!(
        "{expected} repository received a {actual} connection"
    ))
}
