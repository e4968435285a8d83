//! Bearer token minting for local testing

use anyhow::{Context, Result};
use clap::Parser;
use fastexit_core::AuthSettings;
use fastexit_server::http::JwtVerifier;

#[derive(Parser, Debug)]
pub struct TokenArgs {
    /// Value of the `user_id` claim
    #[arg(long)]
    pub user_id: String,

    /// Optional `role` claim
    #[arg(long)]
    pub role: Option<String>,

    /// Token lifetime in minutes (at most one year)
    #[arg(
        long,
        default_value_t = 60,
        value_parser = clap::value_parser!(i64).range(1..=525_600)
    )]
    pub ttl_minutes: i64,

    /// Signing secret (defaults to JWT_SECRET)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub secret: Option<String>,
}

pub fn run_token(args: TokenArgs) -> Result<()> {
    let mut auth = AuthSettings::from_lookup(|name| std::env::var(name).ok());
    if let Some(secret) = args.secret {
        auth.jwt_secret = Some(secret);
    }

    let verifier = JwtVerifier::from_settings(&auth)
        .context("Invalid JWT settings")?
        .context("No signing secret. Set JWT_SECRET or pass --secret")?;
    let token = verifier
        .issue(
            &args.user_id,
            args.role.as_deref(),
            chrono::Duration::minutes(args.ttl_minutes),
        )
        .context("Failed to sign token")?;

    println!("{token}");
    Ok(())
}
