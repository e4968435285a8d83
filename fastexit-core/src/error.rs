/// Domain-level error types.
///
/// Raised only when a business rule on the `User` entity is violated.
/// Nothing in here knows about HTTP or databases.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Username shorter than the minimum length
    #[error("Username must be at least {min} characters")]
    InvalidUsername { min: usize },

    /// Email does not look like `local@domain.tld`
    #[error("Invalid email format: {email}")]
    InvalidEmail { email: String },

    /// Full name update with an empty value
    #[error("Full name cannot be empty")]
    InvalidFullName,

    /// Entity loaded with fields the invariants forbid
    #[error("Invalid user state: {reason}")]
    InvalidState { reason: String },
}

impl DomainError {
    /// Stable machine-readable code, surfaced in API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUsername { .. } => "USER_INVALID_USERNAME",
            Self::InvalidEmail { .. } => "USER_INVALID_EMAIL",
            Self::InvalidFullName => "USER_INVALID_FULL_NAME",
            Self::InvalidState { .. } => "USER_INVALID_STATE",
        }
    }

    /// Create an invalid email error
    pub fn invalid_email(email: impl Into<String>) -> Self {
        Self::InvalidEmail {
            email: email.into(),
        }
    }
}
