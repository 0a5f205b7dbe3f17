use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{ShareInfo, Upload, User};
use crate::storage::StorageProvider;

/// Share-link access control: gates every attempt to fetch a shared file's
/// metadata or bytes.
pub struct ShareService;

impl ShareService {
    /// Get public info for a share token.
    /// The bound recipient email is never exposed, only whether one exists.
    pub async fn get_share_info(db: &Database, token: &str) -> Result<ShareInfo> {
        let upload = Self::find_active(db, token).await?;

        if Self::is_expired(&upload) {
            return Err(AppError::Gone("Share link has expired".to_string()));
        }

        let uploader: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(&upload.uploader_id)
            .fetch_one(db.pool())
            .await?;

        Ok(ShareInfo {
            id: upload.id,
            original_name: upload.original_name,
            size: upload.size,
            mime_type: upload.mime_type,
            expires_at: upload.expires_at,
            download_count: upload.download_count,
            max_downloads: upload.max_downloads,
            has_recipient_restriction: upload.recipient_email.is_some(),
            created_at: upload.created_at,
            uploader_name: uploader.name,
        })
    }

    /// Resolve a download attempt for a share token.
    ///
    /// Checks run in order: active row, expiry, download cap, recipient
    /// binding, blob presence. On success the download counter is claimed
    /// with a conditional update so concurrent requests can never push it
    /// past the cap, an access record is upserted for recipient-bound
    /// shares, and the blob bytes are returned for streaming.
    pub async fn resolve_download(
        db: &Database,
        storage: &dyn StorageProvider,
        token: &str,
        supplied_email: Option<String>,
    ) -> Result<(Upload, Bytes)> {
        let upload = Self::find_active(db, token).await?;

        if Self::is_expired(&upload) {
            return Err(AppError::Gone("Share link has expired".to_string()));
        }

        if let Some(max) = upload.max_downloads {
            if upload.download_count >= max {
                return Err(AppError::Gone("Download limit reached".to_string()));
            }
        }

        let supplied_email = supplied_email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        // The supplied email is a shared secret of convenience, compared
        // exactly as stored; it authenticates nothing.
        if let Some(ref bound) = upload.recipient_email {
            if supplied_email.as_deref() != Some(bound.as_str()) {
                return Err(AppError::RecipientRequired(
                    "Access denied. This file is shared with a specific recipient.".to_string(),
                ));
            }
        }

        if !storage.exists(&upload.filename).await? {
            return Err(AppError::NotFound("File not found on server".to_string()));
        }

        // Claim a download slot. The cap check and increment are one
        // conditional update; losing the last slot to a concurrent request
        // shows up as zero affected rows.
        let now = Utc::now().to_rfc3339();
        let claimed = sqlx::query(
            r#"
            UPDATE uploads
            SET download_count = download_count + 1, updated_at = ?
            WHERE id = ? AND is_active = 1
              AND (max_downloads IS NULL OR download_count < max_downloads)
            "#,
        )
        .bind(&now)
        .bind(&upload.id)
        .execute(db.pool())
        .await?;

        if claimed.rows_affected() == 0 {
            return Err(AppError::Gone("Download limit reached".to_string()));
        }

        if upload.recipient_email.is_some() {
            if let Some(ref email) = supplied_email {
                Self::record_access(db, token, email).await?;
            }
        }

        let data = storage.get(&upload.filename).await?;

        Ok((upload, data))
    }

    /// Upsert the (token, email) access record; repeated access refreshes the
    /// timestamp instead of inserting a second row.
    async fn record_access(db: &Database, token: &str, email: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO share_access (id, share_token, email, accessed_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (share_token, email)
            DO UPDATE SET accessed_at = excluded.accessed_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(token)
        .bind(email)
        .bind(&now)
        .execute(db.pool())
        .await?;

        Ok(())
    }

    async fn find_active(db: &Database, token: &str) -> Result<Upload> {
        let upload: Option<Upload> =
            sqlx::query_as("SELECT * FROM uploads WHERE share_token = ? AND is_active = 1")
                .bind(token)
                .fetch_optional(db.pool())
                .await?;

        upload.ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }

    fn is_expired(upload: &Upload) -> bool {
        if let Some(ref expires_at) = upload.expires_at {
            if let Ok(expiry) = chrono::DateTime::parse_from_rfc3339(expires_at) {
                return Utc::now() > expiry;
            }
        }
        false
    }
}
