//! Custom Axum extractors
//!
//! Rejections become `INVALID_REQUEST` envelopes instead of axum's plain
//! text bodies.

use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use crate::models::ValidationError;

/// JSON body
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            ApiError::Validation(ValidationError::Malformed {
                part: "body",
                detail: rejection.body_text(),
            })
        })?;
        Ok(Self(value))
    }
}

/// Query string
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                ApiError::Validation(ValidationError::Malformed {
                    part: "query",
                    detail: rejection.body_text(),
                })
            })?;
        Ok(Self(value))
    }
}

/// Integer user id from path
///
/// Any `i64` is accepted; ids that were never assigned come back as
/// `USER_GET_NOT_FOUND` from the use case.
pub struct ValidUserId(pub i64);

impl<S> FromRequestParts<S> for ValidUserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                ApiError::Validation(ValidationError::Malformed {
                    part: "path",
                    detail: rejection.body_text(),
                })
            })?;

        id.parse::<i64>().map(Self).map_err(|_| {
            ApiError::Validation(ValidationError::InvalidFormat {
                field: "user_id",
                reason: "must be an integer",
            })
        })
    }
}
