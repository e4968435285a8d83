//! Command implementations for the fastexit CLI

pub mod config;
pub mod migrate;
pub mod serve;
pub mod token;

pub use config::run_config;
pub use migrate::run_migrate;
pub use serve::run_serve;
pub use token::run_token;

use anyhow::{Context, Result};
use fastexit_core::{Driver, Settings};

/// Settings from the environment, with an optional driver override.
pub(crate) fn load_settings(driver: Option<&str>) -> Result<Settings> {
    let settings = match driver {
        None => Settings::from_env(),
        Some(raw) => {
            let driver: Driver = raw.parse().context("Invalid --driver")?;
            Settings::from_lookup(|name| match name {
                "DATABASE_DRIVER" => Some(driver.as_str().to_owned()),
                "REPOSITORY_TYPE" => None,
                other => std::env::var(other).ok(),
            })
        }
    };
    settings.context("Invalid configuration")
}
