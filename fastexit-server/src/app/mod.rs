//! Application layer - use cases over the user repository

pub mod dto;
pub mod error;
pub mod users;

pub use dto::{
    DeleteUserCommand, DeletedUser, RegisterUserCommand, UpdateUserCommand, UserPagedListQuery,
    UserPagedListResult, UserResult,
};
pub use error::AppError;
pub use users::UserAppService;
