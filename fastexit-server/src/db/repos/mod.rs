//! User repositories
//!
//! Every implementation borrows the active transaction through
//! [`ConnectionAccess`](crate::tx::ConnectionAccess); none of them open,
//! commit or roll back on their own unless configured for autocommit.
//! Uniqueness is left to the store: a violated constraint comes back as
//! [`RepoError::Duplicate`].

pub mod memory;
pub mod orm;
pub mod postgres;

use async_trait::async_trait;
use fastexit_core::User;
use thiserror::Error;

use crate::error::InfraError;

pub use memory::MemoryUserRepository;
pub use orm::SeaOrmUserRepository;
pub use postgres::PgUserRepository;

#[derive(Debug, Error)]
pub enum RepoError {
    /// A unique column already holds this value
    #[error("User already exists: {identifier}")]
    Duplicate { identifier: String },

    #[error(transparent)]
    Infra(#[from] InfraError),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert `user` and return it with its assigned id.
    async fn add(&self, user: &User) -> Result<User, RepoError>;

    /// Persist the mutable fields of a stored user.
    async fn update(&self, user: &User) -> Result<User, RepoError>;

    async fn remove(&self, id: i64) -> Result<(), RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError>;

    /// One page ordered by id, and the total row count.
    async fn find_all(&self, skip: u64, limit: u64) -> Result<(Vec<User>, i64), RepoError>;

    async fn exists_by_username(&self, username: &str) -> Result<bool, RepoError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, RepoError>;
}

/// Convert a stored row into the entity.
pub(crate) fn rehydrate(
    operation: &'static str,
    id: i64,
    username: String,
    email: String,
    full_name: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
) -> Result<User, RepoError> {
    User::from_parts(id, username, email, full_name, created_at).map_err(|e| {
        InfraError::UnexpectedResult {
            operation,
            reason: e.to_string(),
        }
        .into()
    })
}

/// The id of a user that must already be stored.
pub(crate) fn persisted_id(operation: &'static str, user: &User) -> Result<i64, RepoError> {
    user.id.ok_or_else(|| {
        InfraError::UnexpectedResult {
            operation,
            reason: "user has not been persisted".to_owned(),
        }
        .into()
    })
}

/// Pick the offending value for a unique violation on `column`.
pub(crate) fn duplicate_of(user: &User, column: Option<&str>) -> RepoError {
    let identifier = match column {
        Some(c) if c.contains("email") => user.email.clone(),
        _ => user.username.clone(),
    };
    RepoError::Duplicate { identifier }
}

/// Offsets and limits bind as BIGINT; anything past `i64::MAX` saturates.
pub(crate) fn saturating_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
