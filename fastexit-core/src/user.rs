//! User entity
//!
//! The only aggregate in the service. Construction through [`User::create`]
//! enforces the business rules; [`User::from_parts`] rehydrates rows that
//! were already validated when they were written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Minimum username length
pub const MIN_USERNAME_LEN: usize = 3;

/// User entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Assigned by the store on insert; `None` until persisted
    pub id: Option<i64>,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new, not yet persisted user.
    ///
    /// # Rules
    /// - Username has at least 3 characters
    /// - Email is `local@domain` with a dot inside the domain
    /// - `created_at` is the current time
    ///
    /// # Example
    /// ```
    /// use fastexit_core::User;
    ///
    /// let user = User::create("john_doe", "john@example.com", None).unwrap();
    /// assert!(user.id.is_none());
    /// assert!(User::create("jo", "john@example.com", None).is_err());
    /// ```
    pub fn create(
        username: impl Into<String>,
        email: impl Into<String>,
        full_name: Option<String>,
    ) -> Result<Self, DomainError> {
        let username = username.into();
        let email = email.into();

        validate_username(&username)?;
        validate_email(&email)?;

        Ok(Self {
            id: None,
            username,
            email,
            full_name,
            created_at: Utc::now(),
        })
    }

    /// Rehydrate a stored user.
    ///
    /// Only the basic state invariant is checked here; rows loaded from the
    /// store are trusted to have passed [`User::create`] when written.
    pub fn from_parts(
        id: i64,
        username: String,
        email: String,
        full_name: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if username.is_empty() || email.is_empty() {
            return Err(DomainError::InvalidState {
                reason: "username and email must not be empty".to_owned(),
            });
        }

        Ok(Self {
            id: Some(id),
            username,
            email,
            full_name,
            created_at,
        })
    }

    /// Rename the user.
    pub fn change_full_name(&mut self, full_name: impl Into<String>) -> Result<(), DomainError> {
        let full_name = full_name.into();
        if full_name.is_empty() {
            return Err(DomainError::InvalidFullName);
        }
        self.full_name = Some(full_name);
        Ok(())
    }

    /// Whether username and email satisfy the creation rules.
    pub fn is_valid(&self) -> bool {
        validate_username(&self.username).is_ok() && validate_email(&self.email).is_ok()
    }
}

fn validate_username(username: &str) -> Result<(), DomainError> {
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(DomainError::InvalidUsername {
            min: MIN_USERNAME_LEN,
        });
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), DomainError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(DomainError::invalid_email(email));
    };

    if local.is_empty()
        || domain.is_empty()
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(DomainError::invalid_email(email));
    }

    Ok(())
}
