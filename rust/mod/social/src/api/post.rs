use axum::Extension;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, post};
use axum::{Json, Router};

use recharge_core::{Caller, ServiceError};

use crate::api::AppState;
use crate::model::{CreatePost, Post};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post))
        .route("/posts/{id}", delete(delete_post))
}

async fn create_post(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<CreatePost>,
) -> Result<(StatusCode, Json<Post>), ServiceError> {
    caller.require_user(&input.author_id)?;
    let post = svc.create_post(input).map_err(ServiceError::from)?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn delete_post(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_post(id, &caller.user_id).map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}
