//! Use-case inputs and outputs.

use chrono::{DateTime, Utc};
use fastexit_core::User;
use serde::Serialize;

use super::AppError;
use crate::error::InfraError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterUserCommand {
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateUserCommand {
    pub user_id: i64,
    /// `None` leaves the name unchanged
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteUserCommand {
    pub user_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserPagedListQuery {
    pub skip: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserResult {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserResult {
    /// Project a stored user. Users without an id were never persisted.
    pub fn from_domain(user: User) -> Result<Self, AppError> {
        let id = user.id.ok_or_else(|| InfraError::UnexpectedResult {
            operation: "map user",
            reason: "user has no id".to_owned(),
        })?;

        Ok(Self {
            id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            created_at: user.created_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserPagedListResult {
    pub items: Vec<UserResult>,
    pub total_count: i64,
    pub skip: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeletedUser {
    pub id: i64,
    pub deleted_at: DateTime<Utc>,
}
