use fastexit_core::DomainError;
use thiserror::Error;

use crate::db::RepoError;
use crate::error::InfraError;

/// Use-case failure
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("User already exists: {identifier}")]
    DuplicateUser { identifier: String },

    #[error("User not found: {id}")]
    UserNotFound { id: i64 },

    #[error(transparent)]
    Infra(#[from] InfraError),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Domain(e) => e.code(),
            Self::DuplicateUser { .. } => "USER_CREATE_DUPLICATED",
            Self::UserNotFound { .. } => "USER_GET_NOT_FOUND",
            Self::Infra(e) => e.code(),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate { identifier } => Self::DuplicateUser { identifier },
            RepoError::Infra(e) => Self::Infra(e),
        }
    }
}
