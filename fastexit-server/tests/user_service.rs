//! User use cases over the in-memory driver

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use fastexit_core::User;
use fastexit_server::app::{
    AppError, DeleteUserCommand, RegisterUserCommand, UpdateUserCommand, UserAppService,
    UserPagedListQuery,
};
use fastexit_server::db::{
    MemoryStore, MemoryTransactionManager, MemoryUserRepository, Persistence, RepoError,
    UserRepository,
};
use fastexit_server::tx::Transactional;

fn register(username: &str, email: &str) -> RegisterUserCommand {
    RegisterUserCommand {
        username: username.to_owned(),
        email: email.to_owned(),
        full_name: None,
    }
}

fn memory_service() -> (Arc<MemoryStore>, UserAppService) {
    let store = Arc::new(MemoryStore::new());
    let service = Persistence::memory(Arc::clone(&store)).user_service();
    (store, service)
}

/// Delegates to the memory repository and counts `update` calls.
#[derive(Default)]
struct SpyRepository {
    inner: MemoryUserRepository,
    updates: AtomicUsize,
}

#[async_trait]
impl UserRepository for SpyRepository {
    async fn add(&self, user: &User) -> Result<User, RepoError> {
        self.inner.add(user).await
    }

    async fn update(&self, user: &User) -> Result<User, RepoError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(user).await
    }

    async fn remove(&self, id: i64) -> Result<(), RepoError> {
        self.inner.remove(id).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        self.inner.find_by_id(id).await
    }

    async fn find_all(&self, skip: u64, limit: u64) -> Result<(Vec<User>, i64), RepoError> {
        self.inner.find_all(skip, limit).await
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, RepoError> {
        self.inner.exists_by_username(username).await
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, RepoError> {
        self.inner.exists_by_email(email).await
    }
}

#[tokio::test]
async fn create_then_duplicate_username() {
    let (store, service) = memory_service();

    let created = service
        .create_user(register("john_doe", "john@example.com"))
        .await
        .unwrap();
    assert!(created.id > 0);
    assert_eq!(created.email, "john@example.com");

    let err = service
        .create_user(register("john_doe", "other@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateUser { ref identifier } if identifier == "john_doe"));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let (store, service) = memory_service();
    service
        .create_user(register("john_doe", "john@example.com"))
        .await
        .unwrap();

    let err = service
        .create_user(register("johnny", "john@example.com"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "USER_CREATE_DUPLICATED");
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn repository_translates_unique_violations() {
    let (_store, service) = memory_service();
    let repo = MemoryUserRepository::new();
    service
        .create_user(register("john_doe", "john@example.com"))
        .await
        .unwrap();

    // Bypass the use-case checks and hit the store's constraint directly
    let by_username: Result<User, AppError> = Transactional::writable()
        .run(&service, async {
            let user = User::create("john_doe", "fresh@example.com", None)?;
            Ok(repo.add(&user).await?)
        })
        .await;
    assert!(matches!(by_username, Err(AppError::DuplicateUser { .. })));

    let by_email: Result<User, AppError> = Transactional::writable()
        .run(&service, async {
            let user = User::create("fresh_name", "john@example.com", None)?;
            Ok(repo.add(&user).await?)
        })
        .await;
    assert!(matches!(by_email, Err(AppError::DuplicateUser { ref identifier }) if identifier == "john@example.com"));
}

#[tokio::test]
async fn invalid_input_is_a_domain_error() {
    let (store, service) = memory_service();

    let err = service
        .create_user(register("jo", "john@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Domain(_)));

    let err = service
        .create_user(register("john_doe", "not-an-email"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Domain(_)));
    assert!(store.is_empty());
}

#[tokio::test]
async fn update_of_missing_user_never_reaches_repository() {
    let store = Arc::new(MemoryStore::new());
    let spy = Arc::new(SpyRepository::default());
    let service = UserAppService::new(
        Arc::clone(&spy) as Arc<dyn UserRepository>,
        Arc::new(MemoryTransactionManager::new(Arc::clone(&store))),
    );

    let err = service
        .update_user(UpdateUserCommand {
            user_id: 999,
            full_name: Some("X".into()),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UserNotFound { id: 999 }));
    assert_eq!(spy.updates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn update_changes_full_name() {
    let (_store, service) = memory_service();
    let created = service
        .create_user(register("john_doe", "john@example.com"))
        .await
        .unwrap();

    let updated = service
        .update_user(UpdateUserCommand {
            user_id: created.id,
            full_name: Some("John Doe".into()),
        })
        .await
        .unwrap();
    assert_eq!(updated.full_name.as_deref(), Some("John Doe"));
    assert_eq!(updated.created_at, created.created_at);

    // Empty names are rejected by the entity
    let err = service
        .update_user(UpdateUserCommand {
            user_id: created.id,
            full_name: Some(String::new()),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), "USER_INVALID_FULL_NAME");

    let fetched = service.get_user(created.id).await.unwrap();
    assert_eq!(fetched.full_name.as_deref(), Some("John Doe"));
}

#[tokio::test]
async fn list_pages_in_id_order() {
    let (_store, service) = memory_service();
    for i in 1..=10 {
        service
            .create_user(register(&format!("user_{i:02}"), &format!("user{i}@example.com")))
            .await
            .unwrap();
    }

    let page = service
        .list_users(UserPagedListQuery { skip: 5, limit: 3 })
        .await
        .unwrap();

    assert_eq!(page.total_count, 10);
    assert_eq!(page.items.iter().map(|u| u.id).collect::<Vec<_>>(), vec![6, 7, 8]);
    assert_eq!((page.skip, page.limit), (5, 3));

    let tail = service
        .list_users(UserPagedListQuery { skip: 20, limit: 3 })
        .await
        .unwrap();
    assert!(tail.items.is_empty());
    assert_eq!(tail.total_count, 10);
}

#[tokio::test]
async fn delete_commits_and_user_is_gone() {
    let (store, service) = memory_service();
    let created = service
        .create_user(register("john_doe", "john@example.com"))
        .await
        .unwrap();

    let deleted = service
        .delete_user(DeleteUserCommand { user_id: created.id })
        .await
        .unwrap();
    assert_eq!(deleted.id, created.id);
    assert!(store.is_empty());

    let err = service.get_user(created.id).await.unwrap_err();
    assert!(matches!(err, AppError::UserNotFound { .. }));

    let err = service
        .delete_user(DeleteUserCommand { user_id: created.id })
        .await
        .unwrap_err();
    assert_eq!(err.code(), "USER_GET_NOT_FOUND");
}
