//! Account API endpoints: registration, sessions, password reset and flashes.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::json;

use super::{success, ApiResult};
use crate::auth::{hash_password, verify_password, CurrentUser};
use crate::errors::AppError;
use crate::mail::{MailOptions, MailRecipient};
use crate::models::{
    normalize_email, Flash, ForgotPasswordRequest, LoginRequest, RegisterRequest,
    ResetPasswordRequest, SessionGrant,
};
use crate::AppState;

fn check_new_password(password: &str, confirm: &str) -> Result<(), AppError> {
    if password.is_empty() {
        return Err(AppError::Validation("Password cannot be blank!".to_string()));
    }
    if password != confirm {
        return Err(AppError::Validation("Oops! Your passwords do not match".to_string()));
    }
    Ok(())
}

/// POST /api/account/register - Create an account and log it in.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<SessionGrant> {
    let name = request.name.trim();
    let email = normalize_email(&request.email);

    if name.is_empty() {
        return Err(AppError::Validation("You must supply a name!".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::Validation("That email is not valid!".to_string()));
    }
    check_new_password(&request.password, &request.password_confirm)?;

    let hash = hash_password(&request.password)?;
    let user = state.repo.create_user(name, &email, &hash).await?;
    let token = state.repo.create_session(&user.id).await?;

    tracing::info!("Registered user {}", user.id);
    success(SessionGrant { user, token })
}

/// POST /api/account/login - Open a session.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<SessionGrant> {
    let email = normalize_email(&request.email);
    let credentials = state.repo.find_user_by_email(&email).await?;

    let user = match credentials {
        Some(c) if verify_password(&request.password, &c.password_hash) => c.user,
        _ => return Err(AppError::Unauthorized("Failed Login!".to_string())),
    };

    let token = state.repo.create_session(&user.id).await?;
    state
        .repo
        .push_flash(&token, &Flash::success("You are now logged in!"))
        .await?;

    success(SessionGrant { user, token })
}

/// POST /api/account/logout - Close the current session.
pub async fn logout(State(state): State<AppState>, current: CurrentUser) -> ApiResult<()> {
    state.repo.delete_session(&current.session_token).await?;
    success(())
}

/// POST /api/account/forgot - Email a password reset link.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> ApiResult<serde_json::Value> {
    let email = normalize_email(&request.email);
    let user = state
        .repo
        .find_user_by_email(&email)
        .await?
        .map(|c| c.user)
        .ok_or_else(|| AppError::NotFound("No account with that email exists".to_string()))?;

    let token = uuid::Uuid::new_v4().simple().to_string();
    state.repo.set_reset_token(&user.id, &token).await?;

    let reset_url = format!("{}/account/reset/{}", state.config.public_url, token);
    let mut data = serde_json::Map::new();
    data.insert("resetURL".to_string(), json!(reset_url));

    state
        .mailer
        .send_reset_password_email(&MailOptions {
            filename: "password-reset".to_string(),
            user: MailRecipient {
                email: user.email.clone(),
                name: Some(user.name.clone()),
            },
            subject: "Password Reset".to_string(),
            data,
        })
        .await?;

    success(json!({ "message": "You have been emailed a password reset link." }))
}

/// POST /api/account/reset/:token - Set a new password with a reset token.
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(request): Json<ResetPasswordRequest>,
) -> ApiResult<SessionGrant> {
    let user = state
        .repo
        .find_user_by_reset_token(&token)
        .await?
        .ok_or_else(|| {
            AppError::Unauthorized("Password reset is invalid or has expired".to_string())
        })?;

    check_new_password(&request.password, &request.password_confirm)?;

    let hash = hash_password(&request.password)?;
    state.repo.update_password(&user.id, &hash).await?;

    let session_token = state.repo.create_session(&user.id).await?;
    state
        .repo
        .push_flash(
            &session_token,
            &Flash::success("Nice! Your password has been reset! You are now logged in!"),
        )
        .await?;

    tracing::info!("Password reset for user {}", user.id);
    success(SessionGrant {
        user,
        token: session_token,
    })
}

/// GET /api/account/flashes - Read and clear pending flash messages.
pub async fn take_flashes(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Vec<Flash>> {
    success(state.repo.take_flashes(&current.session_token).await?)
}
