use axum::http::StatusCode;
use thiserror::Error;

/// Errors surfaced by the account credential service. Client-facing
/// messages are fixed here; internal variants carry their source for the
/// server-side log only.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Email Taken")]
    EmailTaken,
    #[error("User not found, please sign up")]
    UserNotFound,
    #[error("Invalid password")]
    InvalidPassword,
    #[error("Old password is wrong")]
    InvalidOldPassword,
    #[error("Reset token is invalid or has expired")]
    InvalidResetToken,
    #[error("Internal server error")]
    Hashing(anyhow::Error),
    #[error("Internal server error")]
    Token(anyhow::Error),
    #[error("Internal server error")]
    Database(anyhow::Error),
}

impl UserError {
    pub fn status(&self) -> StatusCode {
        match self {
            UserError::Hashing(_) | UserError::Token(_) | UserError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
