//! fastexit-core: domain model and configuration
//!
//! Holds the pieces every other crate agrees on: the `User` entity with
//! its invariants, the domain error taxonomy, and the environment-driven
//! settings that pick a persistence driver at startup.

pub mod config;
pub mod error;
pub mod user;

pub use config::{AuthSettings, ConfigError, DatabaseSettings, Driver, ServerSettings, Settings};
pub use error::DomainError;
pub use user::User;
