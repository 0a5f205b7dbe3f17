use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use crate::error::{ApiResponse, AppError, Result};
use crate::models::{
    CreateUserRequest, CurrentUser, PageQuery, StatsResponse, UpdateUserRequest,
    UploadListResponse, UserListResponse, UserResponse,
};
use crate::services::UserService;
use crate::AppState;

/// Check if user is admin
fn require_admin(user: &CurrentUser) -> Result<()> {
    if !user.is_admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }
    Ok(())
}

/// List all users with pagination
/// GET /admin/users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<UserListResponse>>> {
    require_admin(&current_user)?;
    let (page, per_page) = query.normalize();
    let users = UserService::list_users(&state.db, page, per_page).await?;
    Ok(Json(ApiResponse::success(users)))
}

/// Create a new user
/// POST /admin/users
pub async fn create_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    require_admin(&current_user)?;
    let user = UserService::create_user(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

/// Update an existing user
/// PUT /admin/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    require_admin(&current_user)?;
    let user = UserService::update_user(&state.db, &id, req).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// Delete a user and their uploads
/// DELETE /admin/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    require_admin(&current_user)?;
    UserService::delete_user(&state.db, state.storage.as_ref(), &current_user.id, &id).await?;
    Ok(Json(ApiResponse::<()>::success_message(
        "User deleted successfully",
    )))
}

/// List all uploads with pagination
/// GET /admin/uploads
pub async fn list_uploads(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<UploadListResponse>>> {
    require_admin(&current_user)?;
    let (page, per_page) = query.normalize();
    let uploads = UserService::list_all_uploads(&state.db, page, per_page).await?;
    Ok(Json(ApiResponse::success(uploads)))
}

/// Get system statistics
/// GET /admin/stats
pub async fn stats(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<StatsResponse>>> {
    require_admin(&current_user)?;
    let stats = UserService::stats(&state.db).await?;
    Ok(Json(ApiResponse::success(stats)))
}
