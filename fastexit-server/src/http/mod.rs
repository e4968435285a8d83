//! HTTP server layer
//!
//! Axum server with:
//! - CORS (localhost only by default)
//! - Request tracing
//! - Optional bearer authentication on the user API
//! - Graceful shutdown
//! - `{code, message, data}` envelopes for every response

pub mod auth;
pub mod error;
pub mod extractors;
pub mod response;
pub mod routes;
pub mod server;

pub use auth::{require_role, JwtVerifier, Principal, RoleGuard, TokenVerifier};
pub use error::ApiError;
pub use response::ApiResponse;
pub use server::{router, run_server, AppState, ServerError};
