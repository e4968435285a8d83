//! fastexit CLI - users service with request-scoped transactions
//!
//! Subcommands:
//! - `serve`: run the HTTP API
//! - `migrate`: create the schema, optionally seed sample users
//! - `token`: mint a bearer token for local testing
//! - `config`: print the resolved configuration

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "fastexit",
    author,
    version,
    about = "Users service where every use case runs in one database transaction",
    long_about = "Serve a small users API over Postgres (sqlx or sea-orm) or an in-memory store. \
                  Each use case owns one transaction; nested use cases join it."
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (requires the telemetry feature)
    #[arg(long, global = true)]
    otel: bool,

    /// Log as JSON lines
    #[arg(long, global = true, env = "LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Create the users table
    Migrate(commands::migrate::MigrateArgs),
    /// Mint a bearer token signed with JWT_SECRET
    Token(commands::token::TokenArgs),
    /// Print the resolved configuration (secrets redacted)
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
        json: cli.log_json,
    })
    .ok();

    let result = match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await,
        Commands::Migrate(args) => commands::run_migrate(args).await,
        Commands::Token(args) => commands::run_token(args),
        Commands::Config(args) => commands::run_config(args),
    };

    tracing_setup::shutdown_otel();
    result
}
