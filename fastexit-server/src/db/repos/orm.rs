//! User repository - sea-orm entities

use async_trait::async_trait;
use fastexit_core::User;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ActiveValue::Unchanged, ColumnTrait, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
};

use super::{duplicate_of, persisted_id, rehydrate, saturating_i64, RepoError, UserRepository};
use crate::db::orm::users;
use crate::error::InfraError;
use crate::tx::{ConnectionAccess, Transaction, TransactionMode};

#[derive(Debug, Clone, Default)]
pub struct SeaOrmUserRepository {
    access: ConnectionAccess,
}

impl SeaOrmUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_access(access: ConnectionAccess) -> Self {
        Self { access }
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn add(&self, user: &User) -> Result<User, RepoError> {
        let acquired = self.access.acquire("add user", TransactionMode::Writable).await?;
        let result = insert(acquired.transaction(), user).await;
        acquired.finish(result).await
    }

    async fn update(&self, user: &User) -> Result<User, RepoError> {
        let acquired = self.access.acquire("update user", TransactionMode::Writable).await?;
        let result = update(acquired.transaction(), user).await;
        acquired.finish(result).await
    }

    async fn remove(&self, id: i64) -> Result<(), RepoError> {
        let acquired = self.access.acquire("delete user", TransactionMode::Writable).await?;
        let result = delete(acquired.transaction(), id).await;
        acquired.finish(result).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        let acquired = self.access.acquire("find user", TransactionMode::Readonly).await?;
        let result = find_by_id(acquired.transaction(), id).await;
        acquired.finish(result).await
    }

    async fn find_all(&self, skip: u64, limit: u64) -> Result<(Vec<User>, i64), RepoError> {
        let acquired = self.access.acquire("list users", TransactionMode::Readonly).await?;
        let result = find_page(acquired.transaction(), skip, limit).await;
        acquired.finish(result).await
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, RepoError> {
        let acquired = self
            .access
            .acquire("check username", TransactionMode::Readonly)
            .await?;
        let result = count_matching(
            acquired.transaction(),
            "check username",
            users::Column::Username.eq(username),
        )
        .await
        .map(|n| n > 0);
        acquired.finish(result).await
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, RepoError> {
        let acquired = self.access.acquire("check email", TransactionMode::Readonly).await?;
        let result = count_matching(
            acquired.transaction(),
            "check email",
            users::Column::Email.eq(email),
        )
        .await
        .map(|n| n > 0);
        acquired.finish(result).await
    }
}

async fn insert(tx: &Transaction, user: &User) -> Result<User, RepoError> {
    let conn = tx.connection().await?;
    let model = users::ActiveModel {
        username: Set(user.username.clone()),
        email: Set(user.email.clone()),
        full_name: Set(user.full_name.clone()),
        created_at: Set(user.created_at),
        ..Default::default()
    }
    .insert(conn.as_sea_orm()?)
    .await
    .map_err(|e| translate("add user", e, user))?;

    into_user("add user", model)
}

async fn update(tx: &Transaction, user: &User) -> Result<User, RepoError> {
    let id = persisted_id("update user", user)?;
    let conn = tx.connection().await?;
    let model = users::ActiveModel {
        id: Unchanged(id),
        full_name: Set(user.full_name.clone()),
        ..Default::default()
    }
    .update(conn.as_sea_orm()?)
    .await
    .map_err(|e| translate("update user", e, user))?;

    into_user("update user", model)
}

async fn delete(tx: &Transaction, id: i64) -> Result<(), RepoError> {
    let conn = tx.connection().await?;
    users::Entity::delete_by_id(id)
        .exec(conn.as_sea_orm()?)
        .await
        .map_err(|e| InfraError::query("delete user", e))?;
    Ok(())
}

async fn find_by_id(tx: &Transaction, id: i64) -> Result<Option<User>, RepoError> {
    let conn = tx.connection().await?;
    users::Entity::find_by_id(id)
        .one(conn.as_sea_orm()?)
        .await
        .map_err(|e| InfraError::query("find user", e))?
        .map(|model| into_user("find user", model))
        .transpose()
}

async fn find_page(tx: &Transaction, skip: u64, limit: u64) -> Result<(Vec<User>, i64), RepoError> {
    let conn = tx.connection().await?;
    let db = conn.as_sea_orm()?;

    let models = users::Entity::find()
        .order_by_asc(users::Column::Id)
        .offset(saturating_i64(skip).unsigned_abs())
        .limit(saturating_i64(limit).unsigned_abs())
        .all(db)
        .await
        .map_err(|e| InfraError::query("list users", e))?;

    let total = users::Entity::find()
        .count(db)
        .await
        .map_err(|e| InfraError::query("count users", e))?;

    let items = models
        .into_iter()
        .map(|model| into_user("list users", model))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((items, i64::try_from(total).unwrap_or(i64::MAX)))
}

async fn count_matching(
    tx: &Transaction,
    operation: &'static str,
    condition: sea_orm::sea_query::SimpleExpr,
) -> Result<u64, RepoError> {
    let conn = tx.connection().await?;
    let count = users::Entity::find()
        .filter(condition)
        .count(conn.as_sea_orm()?)
        .await
        .map_err(|e| InfraError::query(operation, e))?;
    Ok(count)
}

fn into_user(operation: &'static str, model: users::Model) -> Result<User, RepoError> {
    rehydrate(
        operation,
        model.id,
        model.username,
        model.email,
        model.full_name,
        model.created_at,
    )
}

fn translate(operation: &'static str, err: DbErr, user: &User) -> RepoError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        tracing::debug!(operation, %detail, "unique violation");
        return duplicate_of(user, Some(detail.as_str()));
    }
    InfraError::query(operation, err).into()
}
