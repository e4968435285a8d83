//! ORM driver over sea-orm.

use async_trait::async_trait;
use fastexit_core::Driver;
use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::error::InfraError;
use crate::tx::{Connection, Transaction, TransactionManager, TransactionMode};

/// Entity definitions mapped onto the `users` table.
pub mod users {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        #[sea_orm(unique)]
        pub username: String,
        #[sea_orm(unique)]
        pub email: String,
        pub full_name: Option<String>,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Debug, Clone)]
pub struct SeaOrmTransactionManager {
    write: DatabaseConnection,
    read: DatabaseConnection,
}

impl SeaOrmTransactionManager {
    pub fn new(write: DatabaseConnection, read: DatabaseConnection) -> Self {
        Self { write, read }
    }

    async fn begin(&self, mode: TransactionMode) -> Result<Transaction, InfraError> {
        let conn = match mode {
            TransactionMode::Readonly => &self.read,
            TransactionMode::Writable => &self.write,
        };
        let tx = conn.begin().await.map_err(|e| {
            tracing::error!(%mode, error = %e, "failed to begin transaction");
            InfraError::ConnectionFailed {
                mode,
                source: e.into(),
            }
        })?;
        Ok(Transaction::new(mode, Connection::SeaOrm(tx)))
    }
}

#[async_trait]
impl TransactionManager for SeaOrmTransactionManager {
    fn driver(&self) -> Driver {
        Driver::SeaOrm
    }

    async fn create_readonly_transaction(&self) -> Result<Transaction, InfraError> {
        self.begin(TransactionMode::Readonly).await
    }

    async fn create_writable_transaction(&self) -> Result<Transaction, InfraError> {
        self.begin(TransactionMode::Writable).await
    }
}
