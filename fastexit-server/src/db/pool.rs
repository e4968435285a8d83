//! Connection pool management
//!
//! One write target and an optional read replica per driver. When no
//! replica is configured the read handle is a clone of the write handle.

use std::sync::Arc;

use fastexit_core::{DatabaseSettings, Driver};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions as _, PgPool};

use super::memory::MemoryStore;
use crate::error::InfraError;
use crate::tx::TransactionMode;

/// Default maximum connections for a pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Create a PostgreSQL connection pool.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool("postgres://localhost/fastexit").await?;
/// ```
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    create_pool_with_options(database_url, DEFAULT_MAX_CONNECTIONS, false).await
}

/// Create a PostgreSQL connection pool with custom options.
///
/// * `max_connections` - Maximum number of connections in the pool
/// * `sql_echo` - Keep sqlx statement logging on (visible with `RUST_LOG=sqlx=debug`)
pub async fn create_pool_with_options(
    database_url: &str,
    max_connections: u32,
    sql_echo: bool,
) -> Result<PgPool, sqlx::Error> {
    let mut options: PgConnectOptions = database_url.parse()?;
    if !sql_echo {
        options = options.disable_statement_logging();
    }

    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// Create a sea-orm connection with the same limits.
pub async fn create_orm_connection(
    database_url: &str,
    max_connections: u32,
    sql_echo: bool,
) -> Result<DatabaseConnection, sea_orm::DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .max_connections(max_connections)
        .sqlx_logging(sql_echo);
    Database::connect(options).await
}

/// Live handles for the configured driver.
#[derive(Debug, Clone)]
pub enum DatabasePool {
    Sqlx { write: PgPool, read: PgPool },
    SeaOrm {
        write: DatabaseConnection,
        read: DatabaseConnection,
    },
    Memory(Arc<MemoryStore>),
}

impl DatabasePool {
    /// Open the pools `driver` needs. `settings` may be `None` only for
    /// the memory driver.
    pub async fn connect(
        driver: Driver,
        settings: Option<&DatabaseSettings>,
    ) -> Result<Self, InfraError> {
        let settings = match (driver, settings) {
            (Driver::Memory, _) => {
                tracing::info!("Using in-memory store");
                return Ok(Self::Memory(Arc::new(MemoryStore::new())));
            }
            (_, Some(settings)) => settings,
            (_, None) => {
                return Err(InfraError::misconfigured(format!(
                    "driver {driver} needs database settings"
                )))
            }
        };
        let max = settings.max_connections();
        let replica = settings.has_read_replica();

        tracing::info!(%driver, max_connections = max, read_replica = replica, "Connecting to database...");

        let pool = if driver == Driver::Sqlx {
            let write = create_pool_with_options(&settings.write_url, max, settings.sql_echo)
                .await
                .map_err(|e| connection_failed(TransactionMode::Writable, e))?;
            let read = if replica {
                create_pool_with_options(settings.read_url(), max, settings.sql_echo)
                    .await
                    .map_err(|e| connection_failed(TransactionMode::Readonly, e))?
            } else {
                write.clone()
            };
            Self::Sqlx { write, read }
        } else {
            let write = create_orm_connection(&settings.write_url, max, settings.sql_echo)
                .await
                .map_err(|e| connection_failed(TransactionMode::Writable, e))?;
            let read = if replica {
                create_orm_connection(settings.read_url(), max, settings.sql_echo)
                    .await
                    .map_err(|e| connection_failed(TransactionMode::Readonly, e))?
            } else {
                write.clone()
            };
            Self::SeaOrm { write, read }
        };

        tracing::info!("Database connected");
        Ok(pool)
    }

    pub fn driver(&self) -> Driver {
        match self {
            Self::Sqlx { .. } => Driver::Sqlx,
            Self::SeaOrm { .. } => Driver::SeaOrm,
            Self::Memory(_) => Driver::Memory,
        }
    }

    /// Close every pool. Outstanding connections finish first.
    pub async fn close(&self) {
        match self {
            Self::Sqlx { write, read } => {
                read.close().await;
                write.close().await;
            }
            Self::SeaOrm { write, read } => {
                for conn in [read.clone(), write.clone()] {
                    if let Err(e) = conn.close().await {
                        tracing::warn!(error = %e, "failed to close database connection");
                    }
                }
            }
            Self::Memory(_) => {}
        }
        tracing::info!(driver = %self.driver(), "Database closed");
    }
}

fn connection_failed(mode: TransactionMode, source: impl Into<crate::error::DriverError>) -> InfraError {
    tracing::error!(%mode, "database connection failed");
    InfraError::ConnectionFailed {
        mode,
        source: source.into(),
    }
}
