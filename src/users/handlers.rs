use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument, warn};

use crate::{
    state::AppState,
    users::{
        dto::{
            LoginRequest, RegisterRequest, ResetPasswordRequest, TokenResponse,
            UpdatePasswordRequest, UpdateProfileRequest,
        },
        error::UserError,
        jwt::AuthUser,
        repo_types::User,
        services,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(me))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/updateuser", post(update_user))
        .route("/updatepassword", post(update_password))
        .route("/forgotPassword", get(forgot_password))
        .route("/resetpassword/:token", post(reset_password))
}

fn reject(err: UserError) -> (StatusCode, String) {
    let status = err.status();
    if status.is_server_error() {
        error!(error = ?err, "request failed");
    }
    (status, err.to_string())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), (StatusCode, String)> {
    payload.name = payload.name.trim().to_string();
    payload.email = payload.email.trim().to_string();

    if payload.name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Name is required".into()));
    }
    if !services::is_valid_email(&payload.email) {
        warn!("invalid email on register");
        return Err((
            StatusCode::BAD_REQUEST,
            "Please enter a valid email".into(),
        ));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    let user = services::register(&state, &payload.name, &payload.email, &payload.password)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_string();

    if !services::is_valid_email(&payload.email) {
        warn!("invalid email on login");
        return Err((
            StatusCode::BAD_REQUEST,
            "Please enter a valid email".into(),
        ));
    }
    if payload.password.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Password is required".into()));
    }

    let token = services::authenticate(&state, &payload.email, &payload.password)
        .await
        .map_err(reject)?;
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<User>, (StatusCode, String)> {
    let user = services::current_user(&state, user_id)
        .await
        .map_err(reject)?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<User>, (StatusCode, String)> {
    if let Some(email) = payload.submitted_email() {
        if !services::is_valid_email(&email) {
            warn!("invalid email on profile update");
            return Err((
                StatusCode::BAD_REQUEST,
                "Please enter a valid email".into(),
            ));
        }
    }

    let user = services::update_profile(&state, user_id, payload)
        .await
        .map_err(reject)?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<String, (StatusCode, String)> {
    if payload.old_password.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Old Password is required".into()));
    }
    if payload.new_password.len() < 8 {
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    services::update_password(&state, user_id, &payload.old_password, &payload.new_password)
        .await
        .map_err(reject)?;
    Ok("Password updated".to_string())
}

/// Always answers with the same confirmation for non-internal failures so
/// the response does not reveal account state.
#[instrument(skip(state))]
pub async fn forgot_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<String, (StatusCode, String)> {
    match services::initiate_password_reset(&state, user_id).await {
        Ok(()) => Ok("Forgot password".to_string()),
        Err(err) if err.status().is_server_error() => Err(reject(err)),
        Err(err) => {
            warn!(error = %err, "reset initiation rejected");
            Ok("Forgot password".to_string())
        }
    }
}

#[instrument(skip(state, token, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<String, (StatusCode, String)> {
    if payload.new_password.len() < 8 {
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    services::complete_password_reset(&state, &token, &payload.new_password)
        .await
        .map_err(reject)?;
    Ok("Password reset successful".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_maps_client_and_server_errors() {
        let (status, msg) = reject(UserError::EmailTaken);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(msg, "Email Taken");

        let (status, msg) = reject(UserError::Database(anyhow::anyhow!("pool timeout")));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(msg, "Internal server error");
    }

    #[test]
    fn update_password_request_uses_camel_case() {
        let payload: UpdatePasswordRequest = serde_json::from_str(
            r#"{"oldPassword": "secret-1", "newPassword": "secret-2"}"#,
        )
        .unwrap();
        assert_eq!(payload.old_password, "secret-1");
        assert_eq!(payload.new_password, "secret-2");
    }
}
