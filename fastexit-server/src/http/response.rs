//! Response envelope: `{code, message, data}`

use serde::{Serialize, Serializer};

/// `0` on success, a stable string code on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    Success,
    Error(&'static str),
}

impl Serialize for ResponseCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success => serializer.serialize_u8(0),
            Self::Error(code) => serializer.serialize_str(code),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub code: ResponseCode,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            code: ResponseCode::Success,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn error(code: &'static str, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            code: ResponseCode::Error(code),
            message: message.into(),
            data,
        }
    }
}
