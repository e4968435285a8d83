//! User request schemas
//!
//! Only shape is checked here. Business rules (minimum username length,
//! email domain) belong to the domain and fail with its own codes.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::ValidationError;
use crate::app::{RegisterUserCommand, UpdateUserCommand};

const MAX_USERNAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 255;
const MAX_FULL_NAME_LEN: usize = 255;

/// `local@domain` with no whitespace; the domain rules are checked later.
static EMAIL_SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("invalid email regex"));

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl CreateUserRequest {
    /// Validate the request and convert it into a command.
    ///
    /// # Example
    /// ```
    /// use fastexit_server::models::CreateUserRequest;
    ///
    /// let req = CreateUserRequest {
    ///     username: "john_doe".into(),
    ///     email: "john@example.com".into(),
    ///     full_name: None,
    /// };
    /// assert!(req.into_command().is_ok());
    /// ```
    pub fn into_command(self) -> Result<RegisterUserCommand, ValidationError> {
        check_len("username", &self.username, MAX_USERNAME_LEN)?;
        check_len("email", &self.email, MAX_EMAIL_LEN)?;
        if !EMAIL_SHAPE_RE.is_match(&self.email) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "must look like local@domain",
            });
        }
        if let Some(full_name) = &self.full_name {
            check_len("full_name", full_name, MAX_FULL_NAME_LEN)?;
        }

        Ok(RegisterUserCommand {
            username: self.username,
            email: self.email,
            full_name: self.full_name,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub full_name: Option<String>,
}

impl UpdateUserRequest {
    pub fn into_command(self, user_id: i64) -> Result<UpdateUserCommand, ValidationError> {
        if let Some(full_name) = &self.full_name {
            check_len("full_name", full_name, MAX_FULL_NAME_LEN)?;
        }
        Ok(UpdateUserCommand {
            user_id,
            full_name: self.full_name,
        })
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_owned(),
            email: email.to_owned(),
            full_name: None,
        }
    }

    #[test]
    fn accepts_valid_shape() {
        let cmd = request("john_doe", "john@example.com").into_command().unwrap();
        assert_eq!(cmd.username, "john_doe");
    }

    #[test]
    fn short_username_is_left_to_domain() {
        assert!(request("ab", "ab@example.com").into_command().is_ok());
        assert!(request("ab", "ab@localhost").into_command().is_ok());
    }

    #[test]
    fn rejects_long_username() {
        let err = request(&"a".repeat(101), "a@example.com").into_command().unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooLong {
                field: "username",
                max: 100
            }
        );
    }

    #[test]
    fn rejects_email_without_at() {
        let err = request("john_doe", "john.example.com").into_command().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { field: "email", .. }));
        assert!(request("john_doe", "john @example.com").into_command().is_err());
    }

    #[test]
    fn update_checks_full_name_length() {
        let req = UpdateUserRequest {
            full_name: Some("x".repeat(256)),
        };
        assert!(req.into_command(1).is_err());

        let cmd = UpdateUserRequest::default().into_command(7).unwrap();
        assert_eq!(cmd.user_id, 7);
        assert!(cmd.full_name.is_none());
    }
}
