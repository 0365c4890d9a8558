use axum::extract::{Path, Query, State};
use axum::Extension;
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};

use recharge_core::{Caller, ServiceError};

use crate::api::AppState;
use crate::model::{
    ChangePasswordRequest, EmailQuery, FcmTokenRequest, NicknameQuery, User, UserIdQuery,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/check-id", get(check_user_id))
        .route("/users/check-nickname", get(check_nickname))
        .route("/users/check-email", get(check_email))
        .route(
            "/users/{user_id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/users/{user_id}/password", put(change_password))
        .route("/users/{user_id}/fcm-token", put(update_fcm_token))
}

async fn check_user_id(
    State(svc): State<AppState>,
    Query(q): Query<UserIdQuery>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let exists = svc.check_user_id(&q.user_id).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "exists": exists })))
}

async fn check_nickname(
    State(svc): State<AppState>,
    Query(q): Query<NicknameQuery>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let exists = svc.check_nickname(&q.user_nickname).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "exists": exists })))
}

async fn check_email(
    State(svc): State<AppState>,
    Query(q): Query<EmailQuery>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let exists = svc.check_email(&q.user_email).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "exists": exists })))
}

async fn get_user(
    State(svc): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, ServiceError> {
    let user = svc.get_user(&user_id).map_err(ServiceError::from)?;
    Ok(Json(user))
}

async fn update_user(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<User>, ServiceError> {
    caller.require_user(&user_id)?;
    let user = svc.update_user_info(&user_id, patch).map_err(ServiceError::from)?;
    Ok(Json(user))
}

async fn delete_user(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    caller.require_user(&user_id)?;
    svc.delete_user(&user_id).map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_password(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<String>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    caller.require_user(&user_id)?;
    let updated = svc
        .change_password(&user_id, &req.user_pwd)
        .map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "updated": updated })))
}

async fn update_fcm_token(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<String>,
    Json(req): Json<FcmTokenRequest>,
) -> Result<StatusCode, ServiceError> {
    caller.require_user(&user_id)?;
    svc.update_fcm_token(&user_id, &req.token)
        .map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}
