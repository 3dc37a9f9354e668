use std::sync::Arc;

use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::mailer::Mail;
use crate::state::AppState;
use crate::users::dto::UpdateProfileRequest;
use crate::users::error::UserError;
use crate::users::jwt::JwtKeys;
use crate::users::password::{hash_password, verify_password};
use crate::users::repo_types::User;
use crate::users::reset;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Argon2 is CPU-bound; both directions run on blocking workers so they
/// never stall unrelated requests on the async executor.
async fn hash_blocking(plain: String) -> Result<String, UserError> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| UserError::Hashing(anyhow::anyhow!(e)))?
        .map_err(UserError::Hashing)
}

async fn verify_blocking(plain: String, hash: String) -> Result<bool, UserError> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
        .await
        .map_err(|e| UserError::Hashing(anyhow::anyhow!(e)))?
        .map_err(UserError::Hashing)
}

pub async fn register(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
) -> Result<User, UserError> {
    if User::find_by_email(&state.db, email)
        .await
        .map_err(UserError::Database)?
        .is_some()
    {
        warn!(email = %email, "registration with taken email");
        return Err(UserError::EmailTaken);
    }

    let hash = hash_blocking(password.to_owned()).await?;
    let user = User::create(&state.db, name, email, &hash)
        .await
        .map_err(UserError::Database)?;
    info!(user_id = %user.id, "user registered");
    Ok(user)
}

pub async fn authenticate(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<String, UserError> {
    let user = User::find_by_email(&state.db, email)
        .await
        .map_err(UserError::Database)?
        .ok_or(UserError::UserNotFound)?;

    let ok = verify_blocking(password.to_owned(), user.password_hash.clone()).await?;
    if !ok {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(UserError::InvalidPassword);
    }

    let keys = JwtKeys::from_ref(state);
    let token = keys.sign(user.id).map_err(UserError::Token)?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}

pub async fn current_user(state: &AppState, user_id: Uuid) -> Result<User, UserError> {
    User::find_by_id(&state.db, user_id)
        .await
        .map_err(UserError::Database)?
        .ok_or(UserError::UserNotFound)
}

pub async fn update_profile(
    state: &AppState,
    user_id: Uuid,
    update: UpdateProfileRequest,
) -> Result<User, UserError> {
    let mut user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(UserError::Database)?
        .ok_or(UserError::UserNotFound)?;

    // An email change is rejected unless the claiming record is our own.
    if let Some(target) = update.submitted_email() {
        if let Some(existing) = User::find_by_email(&state.db, &target)
            .await
            .map_err(UserError::Database)?
        {
            if existing.id != user.id {
                warn!(user_id = %user.id, "profile update to taken email");
                return Err(UserError::EmailTaken);
            }
        }
    }

    update.merge_into(&mut user);
    let user = User::update_profile(&state.db, &user)
        .await
        .map_err(UserError::Database)?;
    info!(user_id = %user.id, "profile updated");
    Ok(user)
}

pub async fn update_password(
    state: &AppState,
    user_id: Uuid,
    old_password: &str,
    new_password: &str,
) -> Result<(), UserError> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(UserError::Database)?
        .ok_or(UserError::UserNotFound)?;

    let ok = verify_blocking(old_password.to_owned(), user.password_hash.clone()).await?;
    if !ok {
        warn!(user_id = %user.id, "password change with wrong old password");
        return Err(UserError::InvalidOldPassword);
    }

    let hash = hash_blocking(new_password.to_owned()).await?;
    User::update_password_hash(&state.db, user.id, &hash)
        .await
        .map_err(UserError::Database)?;
    info!(user_id = %user.id, "password updated");
    Ok(())
}

/// Create a reset token and dispatch the reset email. Delivery runs on a
/// spawned task; a transport failure is logged and never reaches the
/// caller, so the endpoint answers before the mail settles.
pub async fn initiate_password_reset(state: &AppState, user_id: Uuid) -> Result<(), UserError> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(UserError::Database)?
        .ok_or(UserError::UserNotFound)?;

    let secret = reset::initiate(&state.db, user.id).await?;
    let reset_url = format!("{}/resetpassword/{}", state.config.frontend_url, secret);

    let mail = Mail {
        to: user.email.clone(),
        subject: "Password Reset Request".into(),
        html_body: reset_email_body(&user.name, &reset_url),
    };
    let mailer = Arc::clone(&state.mailer);
    tokio::spawn(async move {
        if let Err(e) = mailer.send(mail).await {
            error!(error = %e, "reset email delivery failed");
        }
    });

    info!(user_id = %user.id, "password reset initiated");
    Ok(())
}

/// The missing half of the reset flow: consume the token, then store a
/// fresh hash of the new password for the owning user.
pub async fn complete_password_reset(
    state: &AppState,
    raw_token: &str,
    new_password: &str,
) -> Result<(), UserError> {
    let user_id = reset::consume(&state.db, raw_token).await?;
    let hash = hash_blocking(new_password.to_owned()).await?;
    User::update_password_hash(&state.db, user_id, &hash)
        .await
        .map_err(UserError::Database)?;
    info!(user_id = %user_id, "password reset completed");
    Ok(())
}

fn reset_email_body(name: &str, reset_url: &str) -> String {
    format!(
        "<h2>Hello {name}</h2>\n\
         <p>Please use the url below to reset your password</p>\n\
         <p>This reset link is valid for only 30 minutes</p>\n\
         <a href=\"{reset_url}\" clicktracking=\"off\">{reset_url}</a>\n\
         <p>Regards...</p>\n\
         <p>Inventra</p>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("ann@x.com"));
        assert!(is_valid_email("a.b+tag@sub.example.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("ann"));
        assert!(!is_valid_email("ann@"));
        assert!(!is_valid_email("ann@x"));
        assert!(!is_valid_email("ann @x.com"));
    }

    #[tokio::test]
    async fn hashing_runs_on_blocking_workers() {
        let hash = hash_blocking("secret1".into()).await.expect("hash");
        assert!(verify_blocking("secret1".into(), hash.clone())
            .await
            .expect("verify"));
        assert!(!verify_blocking("wrong".into(), hash).await.expect("verify"));
    }

    #[test]
    fn reset_email_contains_url_but_not_markup_errors() {
        let body = reset_email_body("Ann", "http://localhost:3000/resetpassword/abc123");
        assert!(body.contains("Hello Ann"));
        assert!(body.contains("http://localhost:3000/resetpassword/abc123"));
        assert!(body.contains("30 minutes"));
    }
}
