//! User use cases
//!
//! Every public method is one transactional boundary. Methods that call
//! each other join the caller's transaction.

use std::sync::Arc;

use chrono::Utc;
use fastexit_core::User;

use super::dto::{
    DeleteUserCommand, DeletedUser, RegisterUserCommand, UpdateUserCommand, UserPagedListQuery,
    UserPagedListResult, UserResult,
};
use super::AppError;
use crate::db::UserRepository;
use crate::tx::{HasTransactionManager, TransactionManager, Transactional};

const SAMPLE_USERS: [(&str, &str, &str); 3] = [
    ("john_doe", "john@example.com", "John Doe"),
    ("jane_smith", "jane@example.com", "Jane Smith"),
    ("bob_wilson", "bob@example.com", "Bob Wilson"),
];

#[derive(Clone)]
pub struct UserAppService {
    users: Arc<dyn UserRepository>,
    transactions: Option<Arc<dyn TransactionManager>>,
}

impl HasTransactionManager for UserAppService {
    fn transaction_manager(&self) -> Option<&dyn TransactionManager> {
        self.transactions.as_deref()
    }
}

impl UserAppService {
    pub fn new(users: Arc<dyn UserRepository>, transactions: Arc<dyn TransactionManager>) -> Self {
        Self {
            users,
            transactions: Some(transactions),
        }
    }

    /// A service with no transaction manager; every use case fails with
    /// `Misconfigured`.
    pub fn without_transactions(users: Arc<dyn UserRepository>) -> Self {
        Self {
            users,
            transactions: None,
        }
    }

    #[tracing::instrument(skip_all, fields(username = %command.username))]
    pub async fn create_user(&self, command: RegisterUserCommand) -> Result<UserResult, AppError> {
        Transactional::writable()
            .run(self, async {
                if self.users.exists_by_username(&command.username).await? {
                    return Err(AppError::DuplicateUser {
                        identifier: command.username.clone(),
                    });
                }
                if self.users.exists_by_email(&command.email).await? {
                    return Err(AppError::DuplicateUser {
                        identifier: command.email.clone(),
                    });
                }

                let user = User::create(
                    command.username.clone(),
                    command.email.clone(),
                    command.full_name.clone(),
                )?;
                let saved = self.users.add(&user).await?;
                tracing::info!(user_id = ?saved.id, "user created");
                UserResult::from_domain(saved)
            })
            .await
    }

    #[tracing::instrument(skip_all, fields(user_id = command.user_id))]
    pub async fn update_user(&self, command: UpdateUserCommand) -> Result<UserResult, AppError> {
        Transactional::writable()
            .run(self, async {
                let mut user = self.require(command.user_id).await?;
                if let Some(full_name) = &command.full_name {
                    user.change_full_name(full_name.clone())?;
                }

                let saved = self.users.update(&user).await?;
                tracing::info!("user updated");
                UserResult::from_domain(saved)
            })
            .await
    }

    #[tracing::instrument(skip_all, fields(user_id = command.user_id))]
    pub async fn delete_user(&self, command: DeleteUserCommand) -> Result<DeletedUser, AppError> {
        Transactional::writable()
            .run(self, async {
                self.require(command.user_id).await?;
                self.users.remove(command.user_id).await?;
                tracing::info!("user deleted");
                Ok(DeletedUser {
                    id: command.user_id,
                    deleted_at: Utc::now(),
                })
            })
            .await
    }

    pub async fn get_user(&self, user_id: i64) -> Result<UserResult, AppError> {
        Transactional::readonly()
            .run(self, async {
                let user = self.require(user_id).await?;
                UserResult::from_domain(user)
            })
            .await
    }

    pub async fn list_users(&self, query: UserPagedListQuery) -> Result<UserPagedListResult, AppError> {
        Transactional::readonly()
            .run(self, async {
                let (users, total_count) = self.users.find_all(query.skip, query.limit).await?;
                let items = users
                    .into_iter()
                    .map(UserResult::from_domain)
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(UserPagedListResult {
                    items,
                    total_count,
                    skip: query.skip,
                    limit: query.limit,
                })
            })
            .await
    }

    /// Insert the sample users into an empty table. All or nothing.
    ///
    /// Returns how many users were inserted.
    pub async fn seed_sample_users(&self) -> Result<usize, AppError> {
        Transactional::writable()
            .run(self, async {
                let (_, total) = self.users.find_all(0, 1).await?;
                if total > 0 {
                    tracing::info!(existing = total, "users present, skipping seed");
                    return Ok(0);
                }

                for (username, email, full_name) in SAMPLE_USERS {
                    self.create_user(RegisterUserCommand {
                        username: username.to_owned(),
                        email: email.to_owned(),
                        full_name: Some(full_name.to_owned()),
                    })
                    .await?;
                }
                tracing::info!(count = SAMPLE_USERS.len(), "sample users seeded");
                Ok(SAMPLE_USERS.len())
            })
            .await
    }

    async fn require(&self, user_id: i64) -> Result<User, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound { id: user_id })
    }
}
