//! User endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use crate::app::{DeleteUserCommand, DeletedUser, UserPagedListQuery, UserResult};
use crate::http::error::ApiError;
use crate::http::extractors::{ValidJson, ValidQuery, ValidUserId};
use crate::http::response::ApiResponse;
use crate::http::server::AppState;
use crate::models::{CreateUserRequest, Paginated, Pagination, PaginationParams, UpdateUserRequest};

/// User response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub created_at: String,
}

impl From<UserResult> for UserResponse {
    fn from(u: UserResult) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            full_name: u.full_name,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// Deleted user response
#[derive(Debug, Serialize)]
pub struct DeletedUserResponse {
    pub id: i64,
    pub deleted_at: String,
}

impl From<DeletedUser> for DeletedUserResponse {
    fn from(d: DeletedUser) -> Self {
        Self {
            id: d.id,
            deleted_at: d.deleted_at.to_rfc3339(),
        }
    }
}

/// POST /api/users - register a user
async fn create_user(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    let command = req.into_command()?;
    let user = state.users.create_user(command).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("User created successfully", user.into())),
    ))
}

/// GET /api/users - list users ordered by id
async fn list_users(
    State(state): State<Arc<AppState>>,
    ValidQuery(params): ValidQuery<PaginationParams>,
) -> Result<Json<ApiResponse<Paginated<UserResponse>>>, ApiError> {
    let page = Pagination::try_from(params)?;
    let result = state
        .users
        .list_users(UserPagedListQuery {
            skip: page.skip(),
            limit: page.limit(),
        })
        .await?;

    Ok(Json(ApiResponse::ok(
        "success",
        Paginated {
            items: result.items.into_iter().map(UserResponse::from).collect(),
            total_count: result.total_count,
            skip: result.skip,
            limit: result.limit,
        },
    )))
}

/// GET /api/users/{id}
async fn get_user(
    State(state): State<Arc<AppState>>,
    ValidUserId(id): ValidUserId,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = state.users.get_user(id).await?;
    Ok(Json(ApiResponse::ok("success", user.into())))
}

/// PATCH /api/users/{id} - change the full name
async fn update_user(
    State(state): State<Arc<AppState>>,
    ValidUserId(id): ValidUserId,
    ValidJson(req): ValidJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let command = req.into_command(id)?;
    let user = state.users.update_user(command).await?;
    Ok(Json(ApiResponse::ok("User updated successfully", user.into())))
}

/// DELETE /api/users/{id}
async fn delete_user(
    State(state): State<Arc<AppState>>,
    ValidUserId(id): ValidUserId,
) -> Result<Json<ApiResponse<DeletedUserResponse>>, ApiError> {
    let deleted = state.users.delete_user(DeleteUserCommand { user_id: id }).await?;
    Ok(Json(ApiResponse::ok("User deleted successfully", deleted.into())))
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}
