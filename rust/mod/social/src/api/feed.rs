use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use recharge_core::ServiceError;

use crate::api::AppState;
use crate::model::FeedCounter;

pub fn routes() -> Router<AppState> {
    Router::new().route("/userfeed/{user_id}", get(user_feed))
}

/// Profile counters, recomputed on every read.
async fn user_feed(
    State(svc): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<FeedCounter>, ServiceError> {
    let feed = svc.refresh_feed_counter(&user_id).map_err(ServiceError::from)?;
    Ok(Json(feed))
}
