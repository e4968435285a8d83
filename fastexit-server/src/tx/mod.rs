//! Transaction boundaries
//!
//! A use case declares the transaction it needs with [`Transactional`].
//! The first use case entered on a task owns the transaction: it asks the
//! [`TransactionManager`] for one, installs it in the task-local
//! [`TransactionContext`], and commits or rolls it back on the way out.
//! Use cases entered while a transaction is installed join it instead.
//! Repositories never own connections; they borrow the active one through
//! [`ConnectionAccess`].

pub mod access;
pub mod boundary;
pub mod connection;
pub mod context;
pub mod manager;
pub mod transaction;

pub use access::{Acquired, ConnectionAccess};
pub use boundary::{HasTransactionManager, Transactional};
pub use connection::Connection;
pub use context::TransactionContext;
pub use manager::TransactionManager;
pub use transaction::{Transaction, TransactionMode};
