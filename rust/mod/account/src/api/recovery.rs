use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use recharge_core::ServiceError;

use crate::api::AppState;
use crate::model::{
    EmailRequest, FindIdRequest, PasswordResetRequest, ResetPasswordRequest, User,
    VerifyEmailRequest,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/email/send", post(send_email_verification))
        .route("/users/email/verify", post(verify_email))
        .route("/users/find-id", post(find_id))
        .route("/users/password-reset", post(request_password_reset))
        .route("/users/password-reset/confirm", post(reset_password))
        .route("/users/password-reset/{token}", get(user_by_reset_token))
}

async fn send_email_verification(
    State(svc): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let sent = svc
        .send_email_verification(&req.user_email)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "sent": sent })))
}

async fn verify_email(
    State(svc): State<AppState>,
    Json(req): Json<VerifyEmailRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let verified = svc
        .verify_email(&req.user_email, &req.code)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "verified": verified })))
}

async fn find_id(
    State(svc): State<AppState>,
    Json(req): Json<FindIdRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let sent = svc
        .send_user_id_reminder(&req.user_name, &req.user_email)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "sent": sent })))
}

async fn request_password_reset(
    State(svc): State<AppState>,
    Json(req): Json<PasswordResetRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let sent = svc
        .request_password_reset(&req.user_id, &req.user_email)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "sent": sent })))
}

/// GET /api/users/password-reset/{token}: 404 once the token is used or expired.
async fn user_by_reset_token(
    State(svc): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<User>, ServiceError> {
    svc.user_by_reset_token(&token)
        .map_err(ServiceError::from)?
        .map(Json)
        .ok_or_else(|| ServiceError::NotFound("reset token is invalid or expired".into()))
}

async fn reset_password(
    State(svc): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let reset = svc
        .reset_password(&req.token, &req.user_pwd)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "reset": reset })))
}
