//! HTTP server command
//!
//! Wires the configured driver into the user service and runs the API
//! until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use fastexit_server::db::Persistence;
use fastexit_server::http::{run_server, AppState, JwtVerifier};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (overrides BIND_ADDR, default 127.0.0.1:8000)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Persistence driver: sqlx, sea-orm or memory (overrides DATABASE_DRIVER)
    #[arg(long)]
    pub driver: Option<String>,

    /// Create the schema before serving
    #[arg(long)]
    pub migrate: bool,

    /// Insert sample users when the table is empty (implies --migrate)
    #[arg(long)]
    pub seed: bool,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut settings = super::load_settings(args.driver.as_deref())?;
    if let Some(bind) = args.bind {
        settings.server.bind_addr = bind;
    }
    settings.server.cors_permissive |= args.cors_permissive;

    tracing::info!(
        driver = %settings.driver,
        bind = %settings.server.bind_addr,
        "Starting fastexit server"
    );

    let persistence = Persistence::connect(&settings)
        .await
        .context("Failed to connect to the database")?;

    if args.migrate || args.seed {
        persistence.migrate().await.context("Migration failed")?;
    }
    if args.seed {
        let inserted = persistence
            .user_service()
            .seed_sample_users()
            .await
            .context("Seeding failed")?;
        tracing::info!(inserted, "sample users ready");
    }

    let mut state = AppState::new(persistence.user_service());
    match JwtVerifier::from_settings(&settings.auth).context("Invalid JWT settings")? {
        Some(verifier) => {
            tracing::info!("Bearer authentication enabled");
            state = state.with_verifier(Arc::new(verifier));
        }
        None => tracing::warn!("JWT_SECRET not set - user API is unauthenticated"),
    }

    // Run server (blocks until shutdown)
    let served = run_server(state, &settings.server).await.context("Server error");
    persistence.close().await;
    served
}
