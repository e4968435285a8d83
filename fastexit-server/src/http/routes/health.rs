//! Liveness check, served at `/` and `/health` outside the auth layer

use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Liveness {
    pub message: &'static str,
    pub status: &'static str,
    pub version: &'static str,
}

async fn liveness() -> Json<Liveness> {
    Json(Liveness {
        message: "FastExit API is running",
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(liveness))
        .route("/health", get(liveness))
}
