use sqlx::FromRow;

/// Access record for a recipient-bound share; one row per (token, email),
/// refreshed on repeated access.
#[derive(Debug, Clone, FromRow)]
pub struct ShareAccess {
    pub id: String,
    pub share_token: String,
    pub email: String,
    pub accessed_at: String,
}
