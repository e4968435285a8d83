//! Request models with validation at construction
//!
//! All user input is validated before it reaches a use case.
//! Invalid input returns ValidationError, not panic.

pub mod pagination;
pub mod user;
pub mod validation;

pub use pagination::{Paginated, Pagination, PaginationParams};
pub use user::{CreateUserRequest, UpdateUserRequest};
pub use validation::ValidationError;
