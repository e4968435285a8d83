//! Print the resolved configuration

use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Persistence driver: sqlx, sea-orm or memory (overrides DATABASE_DRIVER)
    #[arg(long)]
    pub driver: Option<String>,
}

pub fn run_config(args: ConfigArgs) -> Result<()> {
    let settings = super::load_settings(args.driver.as_deref())?;
    let rendered = serde_json::to_string_pretty(&settings.redacted())
        .context("Failed to render configuration")?;
    println!("{rendered}");
    Ok(())
}
