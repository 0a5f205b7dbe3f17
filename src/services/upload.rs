use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use std::path::Path;
use uuid::Uuid;
use validator::ValidateEmail;

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Upload, UploadResponse, UploaderInfo, User};
use crate::storage::StorageProvider;

/// Share token length in alphanumeric characters; 43 chars is ~256 bits.
const SHARE_TOKEN_LEN: usize = 43;

/// Upload service
pub struct UploadService;

impl UploadService {
    /// Ingest an uploaded file: persist the blob, then commit the metadata
    /// row. The blob is removed again if the row cannot be written.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_upload(
        db: &Database,
        storage: &dyn StorageProvider,
        config: &Config,
        uploader_id: &str,
        original_name: &str,
        content_type: Option<String>,
        temp_path: &Path,
        recipient_email: Option<String>,
        expiration_hours: Option<i64>,
        max_downloads: Option<i64>,
    ) -> Result<Upload> {
        if original_name.is_empty() || original_name.contains('/') || original_name.contains('\\') {
            return Err(AppError::BadRequest("Invalid file name".to_string()));
        }

        let recipient_email = recipient_email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        if let Some(ref email) = recipient_email {
            if !email.validate_email() {
                return Err(AppError::BadRequest(
                    "Invalid recipient email format".to_string(),
                ));
            }
        }

        // Storage name is collision-free and independent of the original name
        let extension = original_name
            .rfind('.')
            .map(|pos| &original_name[pos..])
            .unwrap_or("");
        let filename = format!("{}{}", Uuid::new_v4(), extension);

        let expires_at = expiration_hours
            .filter(|h| *h > 0)
            .map(|h| (Utc::now() + Duration::hours(h)).to_rfc3339());
        let max_downloads = max_downloads.filter(|n| *n > 0);

        let metadata = tokio::fs::metadata(temp_path)
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file metadata: {}", e)))?;
        let size = metadata.len() as i64;

        let upload_path = Path::new(&config.storage.upload_dir)
            .join(&filename)
            .display()
            .to_string();

        // Blob first; the metadata insert below compensates by deleting it
        // on failure.
        storage.put_file(&filename, temp_path).await?;

        let upload_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let mut last_error: Option<sqlx::Error> = None;
        let mut inserted = false;
        for _ in 0..10 {
            let token = Self::generate_share_token();

            let result = sqlx::query(
                r#"
                INSERT INTO uploads (
                    id, original_name, filename, mime_type, size, upload_path,
                    share_token, recipient_email, expires_at, max_downloads,
                    uploader_id, created_at, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&upload_id)
            .bind(original_name)
            .bind(&filename)
            .bind(&content_type)
            .bind(size)
            .bind(&upload_path)
            .bind(&token)
            .bind(&recipient_email)
            .bind(&expires_at)
            .bind(max_downloads)
            .bind(uploader_id)
            .bind(&now)
            .bind(&now)
            .execute(db.pool())
            .await;

            match result {
                Ok(_) => {
                    inserted = true;
                    last_error = None;
                    break;
                }
                Err(e) => {
                    let is_token_conflict = match &e {
                        sqlx::Error::Database(db_err) => db_err
                            .message()
                            .contains("UNIQUE constraint failed: uploads.share_token"),
                        _ => false,
                    };
                    if is_token_conflict {
                        last_error = Some(e);
                        continue;
                    }
                    Self::remove_blob(storage, &filename).await;
                    return Err(e.into());
                }
            }
        }

        if !inserted {
            Self::remove_blob(storage, &filename).await;
            return Err(AppError::Internal(format!(
                "Failed to generate unique share token: {}",
                last_error
                    .as_ref()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            )));
        }

        let upload: Upload = sqlx::query_as("SELECT * FROM uploads WHERE id = ?")
            .bind(&upload_id)
            .fetch_one(db.pool())
            .await?;

        Ok(upload)
    }

    /// Active uploads of one user, newest first
    pub async fn list_uploads(db: &Database, uploader_id: &str) -> Result<Vec<UploadResponse>> {
        let uploader: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(uploader_id)
            .fetch_one(db.pool())
            .await?;

        let uploads: Vec<Upload> = sqlx::query_as(
            "SELECT * FROM uploads WHERE uploader_id = ? AND is_active = 1 ORDER BY created_at DESC",
        )
        .bind(uploader_id)
        .fetch_all(db.pool())
        .await?;

        let info = UploaderInfo {
            name: uploader.name,
            email: uploader.email,
        };

        Ok(uploads
            .into_iter()
            .map(|u| UploadResponse::from_upload(u, Some(info.clone())))
            .collect())
    }

    /// Soft-delete an upload.
    /// The row is only matched together with its owner, so a foreign upload id
    /// yields NotFound rather than confirming the upload exists.
    pub async fn delete_upload(
        db: &Database,
        storage: &dyn StorageProvider,
        uploader_id: &str,
        upload_id: &str,
    ) -> Result<()> {
        let upload: Upload = sqlx::query_as("SELECT * FROM uploads WHERE id = ? AND uploader_id = ?")
            .bind(upload_id)
            .bind(uploader_id)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| AppError::NotFound("Upload not found".to_string()))?;

        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE uploads SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(&upload.id)
            .execute(db.pool())
            .await?;

        // Metadata is authoritative; a failed blob removal is only logged
        if let Err(e) = storage.delete(&upload.filename).await {
            tracing::error!("File deletion error for {}: {}", upload.filename, e);
        }

        Ok(())
    }

    fn generate_share_token() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SHARE_TOKEN_LEN)
            .map(char::from)
            .collect()
    }

    async fn remove_blob(storage: &dyn StorageProvider, filename: &str) {
        if let Err(e) = storage.delete(filename).await {
            tracing::error!("Failed to clean up blob {} after insert failure: {}", filename, e);
        }
    }
}
