use std::collections::HashMap;

use axum::Extension;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use recharge_core::{Caller, ServiceError};

use crate::api::AppState;
use crate::model::{Bookmark, BookmarkKey, BookmarkStatusRequest};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookmark/toggle", post(toggle_bookmark))
        .route("/bookmark/check", get(check_bookmark))
        .route("/bookmark/status", post(bookmark_status))
        .route("/bookmark/user/{user_id}", get(user_bookmarks))
}

async fn toggle_bookmark(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(key): Json<BookmarkKey>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    caller.require_user(&key.user_id)?;
    let bookmarked = svc.toggle_bookmark(&key).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "bookmarked": bookmarked })))
}

async fn check_bookmark(
    State(svc): State<AppState>,
    Query(key): Query<BookmarkKey>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let bookmarked = svc.check_bookmark(&key).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "bookmarked": bookmarked })))
}

/// POST /api/bookmark/status, answers `{"<targetId>": bool, ...}`.
async fn bookmark_status(
    State(svc): State<AppState>,
    Json(req): Json<BookmarkStatusRequest>,
) -> Result<Json<HashMap<i64, bool>>, ServiceError> {
    let map = svc
        .bookmark_status_map(&req.user_id, &req.target_type, &req.target_ids)
        .map_err(ServiceError::from)?;
    Ok(Json(map))
}

async fn user_bookmarks(
    State(svc): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Bookmark>>, ServiceError> {
    let items = svc.user_bookmarks(&user_id).map_err(ServiceError::from)?;
    Ok(Json(items))
}
