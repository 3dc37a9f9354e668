use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub photo: Option<String>,
    pub phone: String,
    pub bio: String,
    pub created_at: OffsetDateTime,
}

/// Password reset grant. Only the SHA-256 digest of the client-facing
/// secret is stored; the row is deleted on consumption.
#[derive(Debug, Clone, FromRow)]
pub struct ResetToken {
    pub token_hash: String,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}
