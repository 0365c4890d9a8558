mod bookmark;
mod feed;
mod follow;
mod notification;
mod post;

use std::sync::Arc;

use axum::Router;

use crate::service::SocialService;

/// Shared application state.
pub type AppState = Arc<SocialService>;

/// Build the social API router. Paths are mounted under `/api`.
pub fn build_router(svc: Arc<SocialService>) -> Router {
    let api = Router::new()
        .merge(follow::routes())
        .merge(bookmark::routes())
        .merge(feed::routes())
        .merge(post::routes())
        .merge(notification::routes());

    Router::new().nest("/api", api).with_state(svc)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use recharge_core::Caller;

    use super::*;
    use crate::service::testutil;

    fn app() -> Router {
        build_router(testutil::service())
    }

    async fn call(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    /// Attach the identity the bearer middleware would have set.
    fn as_user(mut req: Request<Body>, user_id: &str) -> Request<Body> {
        req.extensions_mut().insert(Caller::new(user_id, "USER"));
        req
    }

    #[tokio::test]
    async fn follow_check_unfollow_over_http() {
        let app = app();

        let (status, body) = call(
            &app,
            as_user(
                json_request("POST", "/api/follow", serde_json::json!({"followerId": "A", "followingId": "B"})),
                "A",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["feed"]["userId"], "B");
        assert_eq!(body["feed"]["totalCount"], 0);
        assert_eq!(body["feed"]["followerCount"], 1);

        let (_, body) = call(&app, empty_request("GET", "/api/follow/check?followerId=A&followingId=B")).await;
        assert_eq!(body["isFollowing"], true);

        let (status, body) = call(
            &app,
            as_user(empty_request("DELETE", "/api/follow?followerId=A&followingId=B"), "A"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["feed"]["followerCount"], 0);

        let (_, body) = call(&app, empty_request("GET", "/api/follow/check?followerId=A&followingId=B")).await;
        assert_eq!(body["isFollowing"], false);
    }

    #[tokio::test]
    async fn follow_lists_over_http() {
        let app = app();
        for (a, b) in [("B", "C"), ("V", "C")] {
            call(
                &app,
                as_user(
                    json_request("POST", "/api/follow", serde_json::json!({"followerId": a, "followingId": b})),
                    a,
                ),
            )
            .await;
        }

        let (status, body) = call(&app, empty_request("GET", "/api/follow/following?followerId=B&myUserId=V")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["followingId"], "C");
        assert_eq!(body[0]["isFollowing"], true);

        let (_, body) = call(&app, empty_request("GET", "/api/follow/follower?followingId=C&myUserId=B")).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn bookmark_toggle_and_status_over_http() {
        let app = app();
        let key = serde_json::json!({"userId": "userX", "targetType": "POST", "targetId": 42});

        let mut states = Vec::new();
        for _ in 0..3 {
            let (status, body) = call(
                &app,
                as_user(json_request("POST", "/api/bookmark/toggle", key.clone()), "userX"),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            states.push(body["bookmarked"].as_bool().unwrap());
        }
        assert_eq!(states, vec![true, false, true]);

        let (_, body) = call(
            &app,
            empty_request("GET", "/api/bookmark/check?userId=userX&targetType=POST&targetId=42"),
        )
        .await;
        assert_eq!(body["bookmarked"], true);

        let (_, body) = call(
            &app,
            json_request(
                "POST",
                "/api/bookmark/status",
                serde_json::json!({"userId": "userX", "targetType": "POST", "targetIds": [42, 7]}),
            ),
        )
        .await;
        assert_eq!(body["42"], true);
        assert_eq!(body["7"], false);

        let (_, body) = call(&app, empty_request("GET", "/api/bookmark/user/userX")).await;
        assert_eq!(body[0]["targetId"], 42);
    }

    #[tokio::test]
    async fn feed_reflects_posts_after_refresh() {
        let app = app();
        let (status, post) = call(
            &app,
            as_user(
                json_request("POST", "/api/posts", serde_json::json!({"authorId": "W", "title": "hi"})),
                "W",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, feed) = call(&app, empty_request("GET", "/api/userfeed/W")).await;
        assert_eq!(feed["totalCount"], 1);

        let uri = format!("/api/posts/{}", post["id"]);
        let (status, _) = call(&app, as_user(empty_request("DELETE", &uri), "someone")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, as_user(empty_request("DELETE", &uri), "W")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = call(&app, as_user(empty_request("DELETE", &uri), "W")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn blank_ids_are_rejected() {
        let app = app();
        let (status, body) = call(
            &app,
            as_user(
                json_request("POST", "/api/follow", serde_json::json!({"followerId": "A", "followingId": ""})),
                "A",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn empty_inbox_lists_nothing() {
        let app = app();
        let (status, body) = call(
            &app,
            as_user(empty_request("GET", "/api/notifications/user/nobody"), "nobody"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);
    }

    #[tokio::test]
    async fn acting_for_another_user_is_forbidden() {
        let app = app();

        let (status, body) = call(
            &app,
            as_user(
                json_request("POST", "/api/follow", serde_json::json!({"followerId": "victim", "followingId": "B"})),
                "A",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "PERMISSION_DENIED");

        let (_, body) = call(&app, empty_request("GET", "/api/follow/check?followerId=victim&followingId=B")).await;
        assert_eq!(body["isFollowing"], false);

        let forbidden = [
            as_user(empty_request("DELETE", "/api/follow?followerId=victim&followingId=B"), "A"),
            as_user(
                json_request(
                    "POST",
                    "/api/bookmark/toggle",
                    serde_json::json!({"userId": "victim", "targetType": "POST", "targetId": 1}),
                ),
                "A",
            ),
            as_user(
                json_request("POST", "/api/posts", serde_json::json!({"authorId": "victim", "title": "x"})),
                "A",
            ),
            as_user(empty_request("GET", "/api/notifications/user/victim"), "A"),
        ];
        for req in forbidden {
            let (status, _) = call(&app, req).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
        }
    }
}
