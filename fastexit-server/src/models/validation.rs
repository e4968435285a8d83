//! Validation error types

use std::fmt;

/// Request validation failure, reported as `INVALID_REQUEST`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// String doesn't match the required format
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Number outside its allowed range
    OutOfRange { field: &'static str, min: u64, max: u64 },

    /// Body, query or path could not be decoded at all
    Malformed { part: &'static str, detail: String },
}

impl ValidationError {
    /// Name of the offending field or request part.
    pub fn field(&self) -> &'static str {
        match self {
            Self::TooLong { field, .. }
            | Self::InvalidFormat { field, .. }
            | Self::OutOfRange { field, .. } => *field,
            Self::Malformed { part, .. } => *part,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => write!(f, "{}: {}", field, reason),
            Self::OutOfRange { field, min, max } => {
                write!(f, "{} must be between {} and {}", field, min, max)
            }
            Self::Malformed { part, detail } => write!(f, "invalid {}: {}", part, detail),
        }
    }
}

impl std::error::Error for ValidationError {}
