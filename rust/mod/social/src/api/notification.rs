use axum::Extension;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use recharge_core::{Caller, ListParams, ListResult, ServiceError};

use crate::api::AppState;
use crate::model::Notification;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications/user/{user_id}", get(list_notifications))
        .route("/notifications/{id}/read", post(mark_read))
}

async fn list_notifications(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<Notification>>, ServiceError> {
    caller.require_user(&user_id)?;
    let result = svc
        .list_notifications(&user_id, &params)
        .map_err(ServiceError::from)?;
    Ok(Json(result))
}

async fn mark_read(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    svc.mark_notification_read(id, &caller.user_id)
        .map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}
