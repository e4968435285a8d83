//! Database layer - drivers, pools and repositories
//!
//! Three interchangeable drivers sit behind the same two seams, the
//! [`TransactionManager`] and the [`UserRepository`]:
//!
//! - `sqlx`: hand-written SQL on a Postgres pool
//! - `sea-orm`: entity models on a sea-orm connection
//! - `memory`: an in-process store with snapshot transactions
//!
//! The driver is chosen once, from [`Settings::driver`], when
//! [`Persistence::connect`] wires everything together.

pub mod memory;
pub mod migrations;
pub mod orm;
pub mod pool;
pub mod postgres;
pub mod repos;

use std::sync::Arc;

use fastexit_core::{Driver, Settings};

pub use memory::{MemoryStore, MemoryTransactionManager};
pub use orm::SeaOrmTransactionManager;
pub use pool::{create_pool, DatabasePool};
pub use postgres::PgTransactionManager;
pub use repos::{MemoryUserRepository, PgUserRepository, RepoError, SeaOrmUserRepository, UserRepository};

use crate::app::UserAppService;
use crate::error::InfraError;
use crate::tx::TransactionManager;

/// The wired persistence stack for one driver.
#[derive(Clone)]
pub struct Persistence {
    pool: DatabasePool,
    transactions: Arc<dyn TransactionManager>,
    users: Arc<dyn UserRepository>,
}

impl Persistence {
    pub async fn connect(settings: &Settings) -> Result<Self, InfraError> {
        let pool = DatabasePool::connect(settings.driver, settings.database.as_ref()).await?;
        Ok(Self::from_pool(pool))
    }

    /// Wire the manager and repository that match `pool`'s driver.
    pub fn from_pool(pool: DatabasePool) -> Self {
        let (transactions, users): (Arc<dyn TransactionManager>, Arc<dyn UserRepository>) =
            match &pool {
                DatabasePool::Sqlx { write, read } => (
                    Arc::new(PgTransactionManager::new(write.clone(), read.clone())),
                    Arc::new(PgUserRepository::new()),
                ),
                DatabasePool::SeaOrm { write, read } => (
                    Arc::new(SeaOrmTransactionManager::new(write.clone(), read.clone())),
                    Arc::new(SeaOrmUserRepository::new()),
                ),
                DatabasePool::Memory(store) => (
                    Arc::new(MemoryTransactionManager::new(Arc::clone(store))),
                    Arc::new(MemoryUserRepository::new()),
                ),
            };

        tracing::debug!(driver = %pool.driver(), "persistence wired");
        Self {
            pool,
            transactions,
            users,
        }
    }

    /// In-memory stack over `store`.
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self::from_pool(DatabasePool::Memory(store))
    }

    pub fn driver(&self) -> Driver {
        self.pool.driver()
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    pub fn transactions(&self) -> Arc<dyn TransactionManager> {
        Arc::clone(&self.transactions)
    }

    pub fn users(&self) -> Arc<dyn UserRepository> {
        Arc::clone(&self.users)
    }

    pub async fn migrate(&self) -> Result<(), InfraError> {
        migrations::run(&self.pool).await
    }

    /// User use cases bound to this stack.
    pub fn user_service(&self) -> UserAppService {
        UserAppService::new(self.users(), self.transactions())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
