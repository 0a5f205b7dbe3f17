use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{ApiResponse, AppError, Result};
use crate::models::{CurrentUser, UploadResponse, UploaderInfo};
use crate::services::{UploadService, UserService};
use crate::AppState;

/// Upload a file and create its share link
/// POST /upload/
/// Multipart fields: file, recipient_email?, expiration_hours?, max_downloads?
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<UploadResponse>>)> {
    let mut temp_file_path: Option<PathBuf> = None;
    let mut file_name: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut recipient_email: Option<String> = None;
    let mut expiration_hours: Option<i64> = None;
    let mut max_downloads: Option<i64> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to process multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                content_type = field.content_type().map(|s| s.to_string());

                // Stream to a temp file so large uploads never sit in memory
                let temp_path =
                    std::env::temp_dir().join(format!("sharebox_upload_{}", Uuid::new_v4()));

                let mut file = tokio::fs::File::create(&temp_path)
                    .await
                    .map_err(|e| AppError::Internal(format!("Failed to create temp file: {}", e)))?;

                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file chunk: {}", e)))?
                {
                    file.write_all(&chunk)
                        .await
                        .map_err(|e| AppError::Internal(format!("Failed to write temp file: {}", e)))?;
                }

                file.flush()
                    .await
                    .map_err(|e| AppError::Internal(format!("Failed to flush temp file: {}", e)))?;

                temp_file_path = Some(temp_path);
            }
            "recipient_email" => {
                let text = field.text().await.unwrap_or_default();
                if !text.is_empty() {
                    recipient_email = Some(text);
                }
            }
            "expiration_hours" => {
                let text = field.text().await.unwrap_or_default();
                expiration_hours = text.trim().parse().ok();
            }
            "max_downloads" => {
                let text = field.text().await.unwrap_or_default();
                max_downloads = text.trim().parse().ok();
            }
            _ => {}
        }
    }

    let temp_path =
        temp_file_path.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;
    let file_name =
        file_name.ok_or_else(|| AppError::BadRequest("No file selected".to_string()))?;

    let result = UploadService::create_upload(
        &state.db,
        state.storage.as_ref(),
        &state.config,
        &current_user.id,
        &file_name,
        content_type,
        &temp_path,
        recipient_email,
        expiration_hours,
        max_downloads,
    )
    .await;

    if let Err(e) = tokio::fs::remove_file(&temp_path).await {
        tracing::error!("Failed to remove temp file {:?}: {}", temp_path, e);
    }

    let upload = result?;

    let uploader = UserService::get_user(&state.db, &current_user.id).await?;

    if let Some(ref recipient) = upload.recipient_email {
        state
            .mailer
            .send_share_notice(
                recipient,
                &uploader.name,
                &upload.original_name,
                &upload.share_token,
                upload.expires_at.as_deref(),
            )
            .await;
    }

    let response = UploadResponse::from_upload(
        upload,
        Some(UploaderInfo {
            name: uploader.name,
            email: uploader.email,
        }),
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

/// List the authenticated user's active uploads
/// GET /upload/my-uploads
pub async fn my_uploads(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<UploadResponse>>>> {
    let uploads = UploadService::list_uploads(&state.db, &current_user.id).await?;
    Ok(Json(ApiResponse::success(uploads)))
}

/// Soft-delete an upload owned by the authenticated user
/// DELETE /upload/:id
pub async fn delete_upload(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    UploadService::delete_upload(&state.db, state.storage.as_ref(), &current_user.id, &id).await?;
    Ok(Json(ApiResponse::<()>::success_message(
        "Upload deleted successfully",
    )))
}
