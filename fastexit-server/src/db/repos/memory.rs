//! User repository - in-process store

use async_trait::async_trait;
use fastexit_core::User;

use super::{persisted_id, rehydrate, RepoError, UserRepository};
use crate::db::memory::{MemoryConnection, MemoryError, NewUserRow, UserRow};
use crate::error::InfraError;
use crate::tx::{ConnectionAccess, Transaction, TransactionMode};

#[derive(Debug, Clone, Default)]
pub struct MemoryUserRepository {
    access: ConnectionAccess,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_access(access: ConnectionAccess) -> Self {
        Self { access }
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
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
        let result = taken(acquired.transaction(), |conn| conn.username_taken(username)).await;
        acquired.finish(result).await
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, RepoError> {
        let acquired = self.access.acquire("check email", TransactionMode::Readonly).await?;
        let result = taken(acquired.transaction(), |conn| conn.email_taken(email)).await;
        acquired.finish(result).await
    }
}

async fn insert(tx: &Transaction, user: &User) -> Result<User, RepoError> {
    let mut conn = tx.connection().await?;
    let row = conn
        .as_memory()?
        .insert(NewUserRow {
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            created_at: user.created_at,
        })
        .map_err(|e| translate("add user", e))?;
    into_user("add user", row)
}

async fn update(tx: &Transaction, user: &User) -> Result<User, RepoError> {
    let id = persisted_id("update user", user)?;
    let mut conn = tx.connection().await?;
    let memory = conn.as_memory()?;

    let Some(mut row) = memory.get(id).cloned() else {
        return Err(InfraError::UnexpectedResult {
            operation: "update user",
            reason: format!("no row with id {id}"),
        }
        .into());
    };
    row.full_name = user.full_name.clone();

    let row = memory
        .update(row)
        .map_err(|e| translate("update user", e))?
        .ok_or_else(|| InfraError::UnexpectedResult {
            operation: "update user",
            reason: format!("no row with id {id}"),
        })?;
    into_user("update user", row)
}

async fn delete(tx: &Transaction, id: i64) -> Result<(), RepoError> {
    let mut conn = tx.connection().await?;
    if !conn.as_memory()?.delete(id) {
        tracing::debug!(user_id = id, "delete matched no row");
    }
    Ok(())
}

async fn find_by_id(tx: &Transaction, id: i64) -> Result<Option<User>, RepoError> {
    let mut conn = tx.connection().await?;
    conn.as_memory()?
        .get(id)
        .cloned()
        .map(|row| into_user("find user", row))
        .transpose()
}

async fn find_page(tx: &Transaction, skip: u64, limit: u64) -> Result<(Vec<User>, i64), RepoError> {
    let mut conn = tx.connection().await?;
    let (rows, total) = conn.as_memory()?.page(skip, limit);
    let items = rows
        .into_iter()
        .map(|row| into_user("list users", row))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((items, total))
}

async fn taken<F>(tx: &Transaction, check: F) -> Result<bool, RepoError>
where
    F: FnOnce(&MemoryConnection) -> bool,
{
    let mut conn = tx.connection().await?;
    Ok(check(conn.as_memory()?))
}

fn into_user(operation: &'static str, row: UserRow) -> Result<User, RepoError> {
    rehydrate(
        operation,
        row.id,
        row.username,
        row.email,
        row.full_name,
        row.created_at,
    )
}

fn translate(operation: &'static str, err: MemoryError) -> RepoError {
    match err {
        MemoryError::UniqueViolation { value, .. } => RepoError::Duplicate { identifier: value },
        other => InfraError::query(operation, other).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{MemoryStore, MemoryTransactionManager};
    use std::sync::Arc;

    fn autocommit(store: &Arc<MemoryStore>) -> MemoryUserRepository {
        MemoryUserRepository::with_access(ConnectionAccess::Autocommit(Arc::new(
            MemoryTransactionManager::new(Arc::clone(store)),
        )))
    }

    #[tokio::test]
    async fn refuses_to_run_outside_transaction() {
        let repo = MemoryUserRepository::new();
        let err = repo.find_by_id(1).await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::Infra(InfraError::NoActiveTransaction { operation: "find user" })
        ));
    }

    #[tokio::test]
    async fn autocommit_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let repo = autocommit(&store);

        let saved = repo
            .add(&User::create("alice", "alice@example.com", None).unwrap())
            .await
            .unwrap();
        assert_eq!(saved.id, Some(1));
        assert!(repo.exists_by_username("alice").await.unwrap());
        assert!(repo.exists_by_email("alice@example.com").await.unwrap());
        assert!(!repo.exists_by_email("bob@example.com").await.unwrap());

        let mut renamed = saved.clone();
        renamed.change_full_name("Alice A.").unwrap();
        let updated = repo.update(&renamed).await.unwrap();
        assert_eq!(updated.full_name.as_deref(), Some("Alice A."));

        repo.remove(1).await.unwrap();
        assert!(repo.find_by_id(1).await.unwrap().is_none());
        assert_eq!(store.stats().committed, store.stats().begun);
    }

    #[tokio::test]
    async fn duplicate_maps_to_repo_error() {
        let store = Arc::new(MemoryStore::new());
        let repo = autocommit(&store);
        repo.add(&User::create("alice", "alice@example.com", None).unwrap())
            .await
            .unwrap();

        let err = repo
            .add(&User::create("alice", "other@example.com", None).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate { identifier } if identifier == "alice"));
        assert_eq!(store.stats().rolled_back, 1);
    }

    #[tokio::test]
    async fn update_requires_persisted_user() {
        let store = Arc::new(MemoryStore::new());
        let repo = autocommit(&store);
        let err = repo
            .update(&User::create("alice", "alice@example.com", None).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Infra(InfraError::UnexpectedResult { .. })));
    }
}
