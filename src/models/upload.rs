use serde::Serialize;
use sqlx::FromRow;

use crate::models::Pagination;

/// Upload model
#[derive(Debug, Clone, FromRow)]
pub struct Upload {
    pub id: String,
    pub original_name: String,
    pub filename: String,
    pub mime_type: Option<String>,
    pub size: i64,
    pub upload_path: String,
    pub share_token: String,
    pub recipient_email: Option<String>,
    pub expires_at: Option<String>,
    pub download_count: i64,
    pub max_downloads: Option<i64>,
    pub is_active: bool,
    pub uploader_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Uploader identity attached to owner/admin upload views
#[derive(Debug, Clone, Serialize)]
pub struct UploaderInfo {
    pub name: String,
    pub email: String,
}

/// Upload as seen by its owner (and admins); includes the share secret
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: String,
    pub original_name: String,
    pub size: i64,
    pub mime_type: Option<String>,
    pub share_token: String,
    pub recipient_email: Option<String>,
    pub expires_at: Option<String>,
    pub download_count: i64,
    pub max_downloads: Option<i64>,
    pub is_active: bool,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploader: Option<UploaderInfo>,
}

impl UploadResponse {
    pub fn from_upload(upload: Upload, uploader: Option<UploaderInfo>) -> Self {
        Self {
            id: upload.id,
            original_name: upload.original_name,
            size: upload.size,
            mime_type: upload.mime_type,
            share_token: upload.share_token,
            recipient_email: upload.recipient_email,
            expires_at: upload.expires_at,
            download_count: upload.download_count,
            max_downloads: upload.max_downloads,
            is_active: upload.is_active,
            created_at: upload.created_at,
            uploader,
        }
    }
}

/// Upload row joined with its uploader, for admin listings
#[derive(Debug, FromRow)]
pub struct UploadWithUploader {
    pub id: String,
    pub original_name: String,
    pub size: i64,
    pub mime_type: Option<String>,
    pub share_token: String,
    pub recipient_email: Option<String>,
    pub expires_at: Option<String>,
    pub download_count: i64,
    pub max_downloads: Option<i64>,
    pub is_active: bool,
    pub created_at: String,
    pub uploader_name: String,
    pub uploader_email: String,
}

impl From<UploadWithUploader> for UploadResponse {
    fn from(row: UploadWithUploader) -> Self {
        Self {
            id: row.id,
            original_name: row.original_name,
            size: row.size,
            mime_type: row.mime_type,
            share_token: row.share_token,
            recipient_email: row.recipient_email,
            expires_at: row.expires_at,
            download_count: row.download_count,
            max_downloads: row.max_downloads,
            is_active: row.is_active,
            created_at: row.created_at,
            uploader: Some(UploaderInfo {
                name: row.uploader_name,
                email: row.uploader_email,
            }),
        }
    }
}

/// Public share info (safe to return to anyone with the token).
/// Never carries the bound recipient email, only whether one exists.
#[derive(Debug, Serialize)]
pub struct ShareInfo {
    pub id: String,
    pub original_name: String,
    pub size: i64,
    pub mime_type: Option<String>,
    pub expires_at: Option<String>,
    pub download_count: i64,
    pub max_downloads: Option<i64>,
    pub has_recipient_restriction: bool,
    pub created_at: String,
    pub uploader_name: String,
}

/// Paginated upload listing
#[derive(Debug, Serialize)]
pub struct UploadListResponse {
    pub uploads: Vec<UploadResponse>,
    pub pagination: Pagination,
}

/// System-wide usage statistics
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_users: i64,
    pub total_uploads: i64,
    pub active_uploads: i64,
    pub total_size: i64,
}
