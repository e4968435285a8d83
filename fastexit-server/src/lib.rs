//! fastexit-server: transaction boundaries, persistence and the user API
//!
//! # Architecture
//!
//! - `tx`: transaction, manager, task-local context, boundary wrapper
//! - `db`: drivers (sqlx, sea-orm, in-memory), pools, migrations, repositories
//! - `app`: user use cases, each one transactional boundary
//! - `models`: request validation
//! - `http`: axum router, envelopes, error mapping, bearer auth

pub mod app;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod tx;

pub use app::{AppError, UserAppService};
pub use db::{Persistence, RepoError, UserRepository};
pub use error::{DriverError, InfraError};
pub use http::{run_server, AppState};
pub use tx::{Transactional, TransactionContext, TransactionManager, TransactionMode};
