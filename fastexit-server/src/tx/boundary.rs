//! The transactional use-case wrapper.

use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use super::context::ClearOnExit;
use super::{Transaction, TransactionContext, TransactionManager, TransactionMode};
use crate::error::InfraError;

/// Implemented by services whose use cases run inside [`Transactional`].
pub trait HasTransactionManager {
    fn transaction_manager(&self) -> Option<&dyn TransactionManager>;
}

/// Declares that a use case runs inside a transaction of `mode`.
///
/// ```ignore
/// pub async fn create_user(&self, cmd: RegisterUserCommand) -> Result<UserResult, AppError> {
///     Transactional::writable()
///         .run(self, async {
///             let saved = self.users.add(&User::create(cmd.username, cmd.email, None)?).await?;
///             UserResult::from_domain(saved)
///         })
///         .await
/// }
/// ```
///
/// - If a transaction is already active on the task the body joins it and
///   this boundary neither commits nor rolls back. The outer boundary's
///   mode wins.
/// - Otherwise a new transaction is created, installed for the duration of
///   the body, committed on `Ok` and rolled back on `Err`.
/// - Without a transaction manager the call fails when `required`, and the
///   body runs bare when not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transactional {
    mode: TransactionMode,
    required: bool,
}

impl Transactional {
    pub const fn new(mode: TransactionMode) -> Self {
        Self {
            mode,
            required: true,
        }
    }

    pub const fn readonly() -> Self {
        Self::new(TransactionMode::Readonly)
    }

    pub const fn writable() -> Self {
        Self::new(TransactionMode::Writable)
    }

    /// Let the body run without a transaction when no manager is wired.
    pub const fn not_required(self) -> Self {
        Self {
            required: false,
            ..self
        }
    }

    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub async fn run<O, T, E, F>(self, owner: &O, body: F) -> Result<T, E>
    where
        O: HasTransactionManager + ?Sized,
        F: Future<Output = Result<T, E>>,
        E: From<InfraError> + fmt::Display,
    {
        if let Some(active) = TransactionContext::get() {
            tracing::trace!(
                tx_id = %active.id(),
                active_mode = %active.mode(),
                requested_mode = %self.mode,
                "joining active transaction"
            );
            drop(active);
            return body.await;
        }

        let Some(manager) = owner.transaction_manager() else {
            if self.required {
                return Err(InfraError::misconfigured(format!(
                    "{} has no transaction manager but its use case requires a transaction",
                    type_name::<O>()
                ))
                .into());
            }
            tracing::debug!(owner = type_name::<O>(), "no transaction manager, running without a transaction");
            return body.await;
        };

        let tx = Arc::new(manager.create_transaction(self.mode).await?);
        tracing::debug!(tx_id = %tx.id(), mode = %self.mode, "owning transaction");
        TransactionContext::scope(own(tx, body)).await
    }
}

async fn own<T, E, F>(tx: Arc<Transaction>, body: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<InfraError> + fmt::Display,
{
    TransactionContext::set(Arc::clone(&tx))?;
    let _clear = ClearOnExit;
    tx.scope(body).await
}
