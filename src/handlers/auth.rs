use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Serialize;

use crate::error::{ApiResponse, Result};
use crate::models::{AuthResponse, CurrentUser, LoginRequest, RegisterRequest, UserResponse};
use crate::services::{AuthService, UserService};
use crate::AppState;

/// Register a new user
/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>)> {
    let response = AuthService::register(&state.db, &state.config, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

/// Login user
/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>> {
    let response = AuthService::login(&state.db, &state.config, req).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Get the authenticated user
/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let user = UserService::get_user(&state.db, &current_user.id).await?;
    Ok(Json(ApiResponse::success(UserResponse::from(user))))
}

#[derive(Serialize)]
pub struct RegistrationStatus {
    pub registration_enabled: bool,
}

/// Check whether open registration is enabled
/// GET /auth/registration-status
pub async fn registration_status(
    State(state): State<AppState>,
) -> Json<ApiResponse<RegistrationStatus>> {
    Json(ApiResponse::success(RegistrationStatus {
        registration_enabled: state.config.app.open_registration,
    }))
}
