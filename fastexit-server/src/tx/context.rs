//! Task-local slot holding the active transaction.
//!
//! Every owning boundary opens a fresh scope, so concurrent requests, and
//! concurrent branches inside one request, never observe each other's
//! transaction.

use std::cell::RefCell;
use std::future::Future;
use std::sync::Arc;

use super::Transaction;
use crate::error::InfraError;

tokio::task_local! {
    static ACTIVE_TRANSACTION: RefCell<Option<Arc<Transaction>>>;
}

pub struct TransactionContext;

impl TransactionContext {
    /// Run `future` with an empty slot of its own.
    pub async fn scope<F: Future>(future: F) -> F::Output {
        ACTIVE_TRANSACTION.scope(RefCell::new(None), future).await
    }

    /// Whether the caller runs inside a [`TransactionContext::scope`].
    pub fn is_scoped() -> bool {
        ACTIVE_TRANSACTION.try_with(|_| ()).is_ok()
    }

    pub fn get() -> Option<Arc<Transaction>> {
        ACTIVE_TRANSACTION
            .try_with(|slot| slot.borrow().clone())
            .ok()
            .flatten()
    }

    pub fn has_active() -> bool {
        ACTIVE_TRANSACTION
            .try_with(|slot| slot.borrow().is_some())
            .unwrap_or(false)
    }

    /// Install `tx` as the active transaction of the current scope.
    pub fn set(tx: Arc<Transaction>) -> Result<(), InfraError> {
        ACTIVE_TRANSACTION
            .try_with(move |slot| {
                *slot.borrow_mut() = Some(tx);
            })
            .map_err(|_| InfraError::misconfigured("transaction set outside a context scope"))
    }

    /// Empty the slot. A no-op outside a scope.
    pub fn clear() {
        let _ = ACTIVE_TRANSACTION.try_with(|slot| slot.borrow_mut().take());
    }
}

/// Clears the slot when dropped, including when the owning future is cancelled.
pub(crate) struct ClearOnExit;

impl Drop for ClearOnExit {
    fn drop(&mut self) {
        TransactionContext::clear();
    }
}
