use axum::Json;
use serde::Serialize;

use crate::error::ApiResponse;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: String,
}

/// Liveness probe
/// GET /health
pub async fn health() -> Json<ApiResponse<HealthStatus>> {
    Json(ApiResponse::success(HealthStatus {
        status: "OK".to_string(),
    }))
}
