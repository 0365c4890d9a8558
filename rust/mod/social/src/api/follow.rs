use axum::Extension;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};

use recharge_core::{Caller, ServiceError};

use crate::api::AppState;
use crate::model::{FollowEntry, FollowKey, FollowOutcome, FollowerListQuery, FollowingListQuery};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/follow", axum::routing::post(follow).delete(unfollow))
        .route("/follow/check", get(check_follow))
        .route("/follow/following", get(following_list))
        .route("/follow/follower", get(follower_list))
}

/// POST /api/follow, as the follower.
async fn follow(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(key): Json<FollowKey>,
) -> Result<Json<FollowOutcome>, ServiceError> {
    caller.require_user(&key.follower_id)?;
    let outcome = svc.follow(&key).map_err(ServiceError::from)?;
    Ok(Json(outcome))
}

/// DELETE /api/follow?followerId=..&followingId=.., as the follower.
async fn unfollow(
    State(svc): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(key): Query<FollowKey>,
) -> Result<Json<FollowOutcome>, ServiceError> {
    caller.require_user(&key.follower_id)?;
    let outcome = svc.unfollow(&key).map_err(ServiceError::from)?;
    Ok(Json(outcome))
}

/// GET /api/follow/check?followerId=..&followingId=..
async fn check_follow(
    State(svc): State<AppState>,
    Query(key): Query<FollowKey>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let is_following = svc.is_following(&key).map_err(ServiceError::from)?;
    Ok(Json(serde_json::json!({ "isFollowing": is_following })))
}

/// GET /api/follow/following?followerId=..&myUserId=..
async fn following_list(
    State(svc): State<AppState>,
    Query(q): Query<FollowingListQuery>,
) -> Result<Json<Vec<FollowEntry>>, ServiceError> {
    let entries = svc
        .following_list(&q.follower_id, &q.my_user_id)
        .map_err(ServiceError::from)?;
    Ok(Json(entries))
}

/// GET /api/follow/follower?followingId=..&myUserId=..
async fn follower_list(
    State(svc): State<AppState>,
    Query(q): Query<FollowerListQuery>,
) -> Result<Json<Vec<FollowEntry>>, ServiceError> {
    let entries = svc
        .follower_list(&q.following_id, &q.my_user_id)
        .map_err(ServiceError::from)?;
    Ok(Json(entries))
}
