//! Bearer token authentication
//!
//! Tokens are HMAC-signed JWTs carrying `user_id`, an optional `role` and
//! `exp`. The bearer middleware is a no-op when no verifier is configured.
//! Routes that need a role layer [`require_role`] inside [`require_bearer`].

use std::fmt;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use fastexit_core::AuthSettings;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::error::ApiError;
use super::server::AppState;

/// Authenticated caller, inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub role: Option<String>,
}

pub trait TokenVerifier: Send + Sync {
    /// `None` for any invalid, expired or malformed token.
    fn verify(&self, token: &str) -> Option<Principal>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    exp: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unsupported JWT algorithm '{0}' (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),

    #[error("token lifetime {0} is out of range")]
    TtlOutOfRange(Duration),

    #[error("failed to sign token: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),
}

pub struct JwtVerifier {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtVerifier {
    pub fn new(secret: &str, algorithm: &str) -> Result<Self, AuthError> {
        let algorithm = match algorithm.trim().to_ascii_uppercase().as_str() {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            _ => return Err(AuthError::UnsupportedAlgorithm(algorithm.to_owned())),
        };

        Ok(Self {
            algorithm,
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    /// `None` when no secret is configured.
    pub fn from_settings(auth: &AuthSettings) -> Result<Option<Self>, AuthError> {
        auth.jwt_secret
            .as_deref()
            .map(|secret| Self::new(secret, &auth.jwt_algorithm))
            .transpose()
    }

    /// Mint a token for `user_id` valid for `ttl`.
    pub fn issue(&self, user_id: &str, role: Option<&str>, ttl: Duration) -> Result<String, AuthError> {
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .ok_or(AuthError::TtlOutOfRange(ttl))?;
        let claims = Claims {
            user_id: user_id.to_owned(),
            role: role.map(str::to_owned),
            exp: expires_at.timestamp(),
        };
        Ok(encode(&Header::new(self.algorithm), &claims, &self.encoding)?)
    }
}

impl fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Option<Principal> {
        let validation = Validation::new(self.algorithm);
        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Some(Principal {
                user_id: data.claims.user_id,
                role: data.claims.role,
            }),
            Err(e) => {
                tracing::debug!(error = %e, "token rejected");
                None
            }
        }
    }
}

/// Reject requests without a valid bearer token.
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(verifier) = state.verifier.as_deref() else {
        return Ok(next.run(request).await);
    };

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized {
            reason: "Missing bearer token",
        })?;
    let principal = verifier.verify(token.trim()).ok_or(ApiError::Unauthorized {
        reason: "Invalid or expired token",
    })?;

    tracing::debug!(user_id = %principal.user_id, "request authenticated");
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Roles admitted by [`require_role`].
#[derive(Debug, Clone)]
pub struct RoleGuard {
    allowed: Arc<[String]>,
}

impl RoleGuard {
    pub fn any_of<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            allowed: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn permits(&self, principal: &Principal) -> bool {
        principal
            .role
            .as_deref()
            .is_some_and(|role| self.allowed.iter().any(|allowed| allowed == role))
    }
}

/// Reject callers whose role is not admitted by the guard.
///
/// A request without a [`Principal`] is unauthenticated (401); one whose
/// role is missing or not listed is forbidden (403).
pub async fn require_role(
    State(guard): State<RoleGuard>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = request
        .extensions()
        .get::<Principal>()
        .ok_or(ApiError::Unauthorized {
            reason: "Authentication required",
        })?;

    if !guard.permits(principal) {
        tracing::debug!(user_id = %principal.user_id, role = ?principal.role, "role rejected");
        return Err(ApiError::Forbidden {
            required: guard.allowed.join(", "),
        });
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, Persistence};
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use axum::routing::get;
    use axum::{middleware, Router};
    use tower::ServiceExt;

    const SECRET: &str = "test-secret";

    /// `/admin` behind the bearer check and a role guard.
    fn guarded(roles: &[&str]) -> Router {
        let state = AppState::new(Persistence::memory(Arc::new(MemoryStore::new())).user_service())
            .with_verifier(Arc::new(JwtVerifier::new(SECRET, "HS256").unwrap()));
        Router::new()
            .route("/admin", get(|| async { "ok" }))
            .route_layer(middleware::from_fn_with_state(
                RoleGuard::any_of(roles.iter().copied()),
                require_role,
            ))
            .route_layer(middleware::from_fn_with_state(Arc::new(state), require_bearer))
    }

    async fn call(app: Router, role: Option<&str>) -> StatusCode {
        let token = JwtVerifier::new(SECRET, "HS256")
            .unwrap()
            .issue("7", role, Duration::minutes(5))
            .unwrap();
        let request = HttpRequest::builder()
            .uri("/admin")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        app.oneshot(request).await.unwrap().status()
    }

    #[test]
    fn issued_token_verifies() {
        let jwt = JwtVerifier::new("test-secret", "HS256").unwrap();
        let token = jwt.issue("42", Some("admin"), Duration::minutes(5)).unwrap();

        let principal = jwt.verify(&token).unwrap();
        assert_eq!(principal.user_id, "42");
        assert_eq!(principal.role.as_deref(), Some("admin"));
    }

    #[test]
    fn rejects_wrong_secret_and_expired() {
        let jwt = JwtVerifier::new("test-secret", "HS256").unwrap();
        let other = JwtVerifier::new("other-secret", "HS256").unwrap();

        let token = other.issue("42", None, Duration::minutes(5)).unwrap();
        assert!(jwt.verify(&token).is_none());

        let expired = jwt.issue("42", None, Duration::minutes(-10)).unwrap();
        assert!(jwt.verify(&expired).is_none());
        assert!(jwt.verify("not-a-token").is_none());
    }

    #[test]
    fn only_hmac_algorithms() {
        assert!(JwtVerifier::new("s", "hs512").is_ok());
        assert!(matches!(
            JwtVerifier::new("s", "RS256"),
            Err(AuthError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn ttl_past_the_calendar_is_an_error() {
        let jwt = JwtVerifier::new("test-secret", "HS256").unwrap();
        let err = jwt
            .issue("42", None, Duration::days(365 * 1_000_000))
            .unwrap_err();
        assert!(matches!(err, AuthError::TtlOutOfRange(_)));
    }

    #[test]
    fn role_guard_matches_exactly() {
        let guard = RoleGuard::any_of(["admin", "superuser"]);
        let principal = |role: Option<&str>| Principal {
            user_id: "1".into(),
            role: role.map(str::to_owned),
        };

        assert!(guard.permits(&principal(Some("admin"))));
        assert!(guard.permits(&principal(Some("superuser"))));
        assert!(!guard.permits(&principal(Some("Admin"))));
        assert!(!guard.permits(&principal(None)));
    }

    #[tokio::test]
    async fn allowed_role_passes() {
        let status = call(guarded(&["admin", "superuser"]), Some("superuser")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn other_or_missing_role_is_forbidden() {
        assert_eq!(call(guarded(&["admin"]), Some("member")).await, StatusCode::FORBIDDEN);
        assert_eq!(call(guarded(&["admin"]), None).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn role_guard_without_principal_is_unauthorized() {
        let app = Router::new()
            .route("/admin", get(|| async { "ok" }))
            .route_layer(middleware::from_fn_with_state(
                RoleGuard::any_of(["admin"]),
                require_role,
            ));
        let request = HttpRequest::builder().uri("/admin").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn from_settings_without_secret() {
        let auth = AuthSettings {
            jwt_secret: None,
            jwt_algorithm: "HS256".into(),
        };
        assert!(JwtVerifier::from_settings(&auth).unwrap().is_none());
    }
}
