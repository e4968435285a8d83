//! Schema migrations. Idempotent; safe to run on every start.

use sea_orm::ConnectionTrait;

use super::pool::DatabasePool;
use crate::error::InfraError;

const CREATE_USERS: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username VARCHAR(100) NOT NULL UNIQUE,
        email VARCHAR(255) NOT NULL UNIQUE,
        full_name VARCHAR(255),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

/// Run all migrations against the write target.
pub async fn run(pool: &DatabasePool) -> Result<(), InfraError> {
    tracing::info!(driver = %pool.driver(), "Running migrations...");

    match pool {
        DatabasePool::Sqlx { write, .. } => {
            sqlx::query(CREATE_USERS)
                .execute(write)
                .await
                .map_err(|e| InfraError::query("create users table", e))?;
        }
        DatabasePool::SeaOrm { write, .. } => {
            write
                .execute_unprepared(CREATE_USERS)
                .await
                .map_err(|e| InfraError::query("create users table", e))?;
        }
        DatabasePool::Memory(_) => {
            tracing::debug!("memory store has no schema");
        }
    }

    tracing::info!("Migrations complete");
    Ok(())
}
