//! User repository - raw SQL
//!
//! - add: INSERT ... RETURNING, relying on the unique indexes
//! - list: page query plus a separate COUNT

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fastexit_core::User;
use sqlx::FromRow;

use super::{duplicate_of, persisted_id, rehydrate, saturating_i64, RepoError, UserRepository};
use crate::error::InfraError;
use crate::tx::{ConnectionAccess, Transaction, TransactionMode};

/// User record from database
#[derive(Debug, Clone, FromRow)]
struct UserRecord {
    id: i64,
    username: String,
    email: String,
    full_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl UserRecord {
    fn into_user(self, operation: &'static str) -> Result<User, RepoError> {
        rehydrate(
            operation,
            self.id,
            self.username,
            self.email,
            self.full_name,
            self.created_at,
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct PgUserRepository {
    access: ConnectionAccess,
}

impl PgUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_access(access: ConnectionAccess) -> Self {
        Self { access }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn add(&self, user: &User) -> Result<User, RepoError> {
        let acquired = self.access.acquire("add user", TransactionMode::Writable).await?;
        let result = insert(acquired.transaction(), user).await;
        acquired.finish(result).await
    }

    async fn update(&self, user: &User) -> Result<User, RepoError> {
        let acquired = self.access.acquire("update user", TransactionMode::Writable).await?;
        let result = update(acquired.transaction(), user).await;
        acquired.finish(result).await
    }

    async fn remove(&self, id: i64) -> Result<(), RepoError> {
        let acquired = self.access.acquire("delete user", TransactionMode::Writable).await?;
        let result = delete(acquired.transaction(), id).await;
        acquired.finish(result).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        let acquired = self.access.acquire("find user", TransactionMode::Readonly).await?;
        let result = find_by_id(acquired.transaction(), id).await;
        acquired.finish(result).await
    }

    async fn find_all(&self, skip: u64, limit: u64) -> Result<(Vec<User>, i64), RepoError> {
        let acquired = self.access.acquire("list users", TransactionMode::Readonly).await?;
        let result = find_page(acquired.transaction(), skip, limit).await;
        acquired.finish(result).await
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, RepoError> {
        let acquired = self
            .access
            .acquire("check username", TransactionMode::Readonly)
            .await?;
        let result = exists(
            acquired.transaction(),
            "check username",
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
            username,
        )
        .await;
        acquired.finish(result).await
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, RepoError> {
        let acquired = self.access.acquire("check email", TransactionMode::Readonly).await?;
        let result = exists(
            acquired.transaction(),
            "check email",
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
            email,
        )
        .await;
        acquired.finish(result).await
    }
}

async fn insert(tx: &Transaction, user: &User) -> Result<User, RepoError> {
    let mut conn = tx.connection().await?;
    let record: UserRecord = sqlx::query_as(
        r#"
        INSERT INTO users (username, email, full_name, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, username, email, full_name, created_at
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(user.full_name.as_deref())
    .bind(user.created_at)
    .fetch_one(conn.as_postgres()?)
    .await
    .map_err(|e| translate("add user", e, user))?;

    record.into_user("add user")
}

async fn update(tx: &Transaction, user: &User) -> Result<User, RepoError> {
    let id = persisted_id("update user", user)?;
    let mut conn = tx.connection().await?;
    let record: Option<UserRecord> = sqlx::query_as(
        r#"
        UPDATE users SET full_name = $1
        WHERE id = $2
        RETURNING id, username, email, full_name, created_at
        "#,
    )
    .bind(user.full_name.as_deref())
    .bind(id)
    .fetch_optional(conn.as_postgres()?)
    .await
    .map_err(|e| translate("update user", e, user))?;

    record
        .ok_or_else(|| InfraError::UnexpectedResult {
            operation: "update user",
            reason: format!("no row with id {id}"),
        })?
        .into_user("update user")
}

async fn delete(tx: &Transaction, id: i64) -> Result<(), RepoError> {
    let mut conn = tx.connection().await?;
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(conn.as_postgres()?)
        .await
        .map_err(|e| InfraError::query("delete user", e))?;
    Ok(())
}

async fn find_by_id(tx: &Transaction, id: i64) -> Result<Option<User>, RepoError> {
    let mut conn = tx.connection().await?;
    let record: Option<UserRecord> = sqlx::query_as(
        "SELECT id, username, email, full_name, created_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(conn.as_postgres()?)
    .await
    .map_err(|e| InfraError::query("find user", e))?;

    record.map(|r| r.into_user("find user")).transpose()
}

async fn find_page(tx: &Transaction, skip: u64, limit: u64) -> Result<(Vec<User>, i64), RepoError> {
    let mut conn = tx.connection().await?;
    let pg = conn.as_postgres()?;

    let records: Vec<UserRecord> = sqlx::query_as(
        r#"
        SELECT id, username, email, full_name, created_at
        FROM users
        ORDER BY id
        OFFSET $1 LIMIT $2
        "#,
    )
    .bind(saturating_i64(skip))
    .bind(saturating_i64(limit))
    .fetch_all(&mut *pg)
    .await
    .map_err(|e| InfraError::query("list users", e))?;

    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&mut *pg)
        .await
        .map_err(|e| InfraError::query("count users", e))?;

    let users = records
        .into_iter()
        .map(|r| r.into_user("list users"))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((users, total))
}

async fn exists(
    tx: &Transaction,
    operation: &'static str,
    sql: &'static str,
    value: &str,
) -> Result<bool, RepoError> {
    let mut conn = tx.connection().await?;
    let (found,): (bool,) = sqlx::query_as(sql)
        .bind(value)
        .fetch_one(conn.as_postgres()?)
        .await
        .map_err(|e| InfraError::query(operation, e))?;
    Ok(found)
}

fn translate(operation: &'static str, err: sqlx::Error, user: &User) -> RepoError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            tracing::debug!(operation, constraint = ?db_err.constraint(), "unique violation");
            return duplicate_of(user, db_err.constraint());
        }
    }
    InfraError::query(operation, err).into()
}
