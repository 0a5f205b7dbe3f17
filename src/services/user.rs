use chrono::Utc;
use validator::ValidateEmail;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{
    CreateUserRequest, Pagination, StatsResponse, UpdateUserRequest, UploadListResponse,
    UploadResponse, UploadWithUploader, User, UserListResponse, UserResponse,
};
use crate::services::AuthService;
use crate::storage::StorageProvider;

/// User administration service
pub struct UserService;

impl UserService {
    /// Get user by ID
    pub async fn get_user(db: &Database, user_id: &str) -> Result<User> {
        let user: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(user)
    }

    /// List all users, paginated, newest first
    pub async fn list_users(db: &Database, page: i64, per_page: i64) -> Result<UserListResponse> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(db.pool())
            .await?;

        let users: Vec<User> =
            sqlx::query_as("SELECT * FROM users ORDER BY created_at DESC LIMIT ? OFFSET ?")
                .bind(per_page)
                .bind((page - 1) * per_page)
                .fetch_all(db.pool())
                .await?;

        Ok(UserListResponse {
            users: users.into_iter().map(UserResponse::from).collect(),
            pagination: Pagination::new(page, per_page, total.0),
        })
    }

    /// Create a user on behalf of an admin
    pub async fn create_user(db: &Database, req: CreateUserRequest) -> Result<UserResponse> {
        let email = AuthService::normalize_email(&req.email);
        let name = req.name.trim().to_string();

        let user = AuthService::insert_user(db, &email, &req.password, &name, req.is_admin).await?;
        Ok(UserResponse::from(user))
    }

    /// Update a user; absent fields are left unchanged
    pub async fn update_user(
        db: &Database,
        user_id: &str,
        req: UpdateUserRequest,
    ) -> Result<UserResponse> {
        let user = Self::get_user(db, user_id).await?;
        let now = Utc::now().to_rfc3339();

        if let Some(ref email) = req.email {
            let email = AuthService::normalize_email(email);
            if !email.validate_email() {
                return Err(AppError::BadRequest("Invalid email format".to_string()));
            }

            let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
                .bind(&email)
                .fetch_optional(db.pool())
                .await?;

            if existing.map(|u| u.id != user.id).unwrap_or(false) {
                return Err(AppError::BadRequest("Email already in use".to_string()));
            }

            sqlx::query("UPDATE users SET email = ?, updated_at = ? WHERE id = ?")
                .bind(&email)
                .bind(&now)
                .bind(user_id)
                .execute(db.pool())
                .await?;
        }

        if let Some(ref name) = req.name {
            sqlx::query("UPDATE users SET name = ?, updated_at = ? WHERE id = ?")
                .bind(name.trim())
                .bind(&now)
                .bind(user_id)
                .execute(db.pool())
                .await?;
        }

        if let Some(is_admin) = req.is_admin {
            sqlx::query("UPDATE users SET is_admin = ?, updated_at = ? WHERE id = ?")
                .bind(is_admin)
                .bind(&now)
                .bind(user_id)
                .execute(db.pool())
                .await?;
        }

        let updated = Self::get_user(db, user_id).await?;
        Ok(UserResponse::from(updated))
    }

    /// Delete a user and their uploads in one transaction.
    /// The acting admin cannot delete their own account. Blobs are removed
    /// best-effort after the commit; the row state is authoritative.
    pub async fn delete_user(
        db: &Database,
        storage: &dyn StorageProvider,
        acting_user_id: &str,
        user_id: &str,
    ) -> Result<()> {
        if acting_user_id == user_id {
            return Err(AppError::BadRequest(
                "Cannot delete your own account".to_string(),
            ));
        }

        // Existence check first so a missing id reports 404, not a no-op
        Self::get_user(db, user_id).await?;

        let filenames: Vec<(String,)> =
            sqlx::query_as("SELECT filename FROM uploads WHERE uploader_id = ?")
                .bind(user_id)
                .fetch_all(db.pool())
                .await?;

        let mut tx = db.pool().begin().await?;

        sqlx::query("DELETE FROM uploads WHERE uploader_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        for (filename,) in filenames {
            if let Err(e) = storage.delete(&filename).await {
                tracing::error!("Failed to remove blob {} for deleted user: {}", filename, e);
            }
        }

        Ok(())
    }

    /// List all uploads with uploader identity, paginated, newest first.
    /// Includes soft-deleted rows; admins see the full history.
    pub async fn list_all_uploads(
        db: &Database,
        page: i64,
        per_page: i64,
    ) -> Result<UploadListResponse> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM uploads")
            .fetch_one(db.pool())
            .await?;

        let rows: Vec<UploadWithUploader> = sqlx::query_as(
            r#"
            SELECT
              u.id,
              u.original_name,
              u.size,
              u.mime_type,
              u.share_token,
              u.recipient_email,
              u.expires_at,
              u.download_count,
              u.max_downloads,
              u.is_active,
              u.created_at,
              usr.name AS uploader_name,
              usr.email AS uploader_email
            FROM uploads u
            JOIN users usr ON u.uploader_id = usr.id
            ORDER BY u.created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(db.pool())
        .await?;

        Ok(UploadListResponse {
            uploads: rows.into_iter().map(UploadResponse::from).collect(),
            pagination: Pagination::new(page, per_page, total.0),
        })
    }

    /// System statistics; sizes are summed over active uploads only
    pub async fn stats(db: &Database) -> Result<StatsResponse> {
        let total_users: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(db.pool())
            .await?;

        let total_uploads: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM uploads")
            .fetch_one(db.pool())
            .await?;

        let active_uploads: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM uploads WHERE is_active = 1")
                .fetch_one(db.pool())
                .await?;

        let total_size: (i64,) =
            sqlx::query_as("SELECT COALESCE(SUM(size), 0) FROM uploads WHERE is_active = 1")
                .fetch_one(db.pool())
                .await?;

        Ok(StatsResponse {
            total_users: total_users.0,
            total_uploads: total_uploads.0,
            active_uploads: active_uploads.0,
            total_size: total_size.0,
        })
    }
}
