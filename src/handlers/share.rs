use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde::Deserialize;

use crate::error::{ApiResponse, AppError, Result};
use crate::models::ShareInfo;
use crate::services::ShareService;
use crate::AppState;

/// Get information about a shared file without downloading it
/// GET /share/:token/info
pub async fn get_share_info(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<ShareInfo>>> {
    let info = ShareService::get_share_info(&state.db, &token).await?;
    Ok(Json(ApiResponse::success(info)))
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub email: Option<String>,
}

/// Download a shared file
/// GET /share/:token?email=
pub async fn download_shared_file(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response> {
    let (upload, data) =
        ShareService::resolve_download(&state.db, state.storage.as_ref(), &token, query.email)
            .await?;

    let content_type = upload
        .mime_type
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, data.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", upload.original_name),
        )
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}
