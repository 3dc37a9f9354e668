use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::users::error::UserError;
use crate::users::repo_types::ResetToken;

/// Reset tokens are valid for 30 minutes.
pub const RESET_TOKEN_TTL: Duration = Duration::minutes(30);

/// Generate the client-facing reset secret: 32 random bytes, hex encoded.
/// The secret is handed out exactly once and never stored or logged.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Deterministic digest of a presented secret; the database lookup key.
/// No salt here, the manager must recompute the same value on consume.
pub fn digest(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// Create a reset token for the user, replacing any outstanding one.
/// Returns the raw secret for embedding in the one-time reset URL.
pub async fn initiate(db: &PgPool, user_id: Uuid) -> Result<String, UserError> {
    let swept = ResetToken::sweep_expired(db)
        .await
        .map_err(UserError::Database)?;
    if swept > 0 {
        debug!(swept, "expired reset tokens removed");
    }

    let raw = generate_secret();
    let now = OffsetDateTime::now_utc();
    let token = ResetToken {
        token_hash: digest(&raw),
        user_id,
        created_at: now,
        expires_at: now + RESET_TOKEN_TTL,
    };
    ResetToken::replace_for_user(db, &token)
        .await
        .map_err(UserError::Database)?;
    debug!(user_id = %user_id, "reset token stored");
    Ok(raw)
}

/// Consume a presented secret, returning the owning user. Absent, expired
/// and already-used tokens are indistinguishable to the caller.
pub async fn consume(db: &PgPool, raw: &str) -> Result<Uuid, UserError> {
    match ResetToken::consume(db, &digest(raw))
        .await
        .map_err(UserError::Database)?
    {
        Some(user_id) => Ok(user_id),
        None => Err(UserError::InvalidResetToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_64_hex_chars() {
        let secret = generate_secret();
        assert_eq!(secret.len(), 64);
        assert!(secret.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn secrets_are_unique_per_call() {
        assert_ne!(generate_secret(), generate_secret());
    }

    #[test]
    fn digest_is_deterministic() {
        let secret = generate_secret();
        assert_eq!(digest(&secret), digest(&secret));
        assert_eq!(digest(&secret).len(), 64);
    }

    #[test]
    fn digest_differs_from_secret_and_between_secrets() {
        let a = generate_secret();
        let b = generate_secret();
        assert_ne!(digest(&a), a);
        assert_ne!(digest(&a), digest(&b));
    }
}
