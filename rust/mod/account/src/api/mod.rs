mod login;
mod recovery;
mod users;

use std::sync::Arc;

use axum::Router;

use crate::service::AccountService;

/// Shared application state.
pub type AppState = Arc<AccountService>;

/// Paths that must stay reachable without a bearer token.
pub const PUBLIC_PREFIXES: &[&str] = &[
    "/api/users/register",
    "/api/users/login",
    "/api/users/kakao-login",
    "/api/users/email/",
    "/api/users/check-",
    "/api/users/find-id",
    "/api/users/password-reset",
];

/// Build the account API router. Paths are mounted under `/api`.
pub fn build_router(svc: Arc<AccountService>) -> Router {
    let api = Router::new()
        .merge(login::routes())
        .merge(recovery::routes())
        .merge(users::routes());

    Router::new().nest("/api", api).with_state(svc)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use recharge_core::Caller;

    use super::*;
    use crate::service::testutil::{self, RecordingMailer};

    async fn call(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    /// Attach the identity the bearer middleware would have set.
    fn as_user(mut req: Request<Body>, user_id: &str) -> Request<Body> {
        req.extensions_mut().insert(Caller::new(user_id, "USER"));
        req
    }

    fn app() -> (Router, Arc<RecordingMailer>) {
        let (svc, mailer) = testutil::service();
        (build_router(svc), mailer)
    }

    #[tokio::test]
    async fn signup_and_login_over_http() {
        let (app, mailer) = app();

        let (status, body) = call(
            &app,
            json_request("POST", "/api/users/email/send", serde_json::json!({"userEmail": "kim@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sent"], true);

        let code = testutil::code_from(&mailer.last_to("kim@example.com").unwrap());
        let (_, body) = call(
            &app,
            json_request(
                "POST",
                "/api/users/email/verify",
                serde_json::json!({"userEmail": "kim@example.com", "code": code}),
            ),
        )
        .await;
        assert_eq!(body["verified"], true);

        let (status, body) = call(
            &app,
            json_request(
                "POST",
                "/api/users/register",
                serde_json::json!({
                    "userId": "kim",
                    "userPwd": "pw",
                    "userName": "Kim",
                    "userNickname": "kimmy",
                    "userEmail": "kim@example.com"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["userId"], "kim");
        assert!(body.get("userPwd").is_none());

        let (_, body) = call(&app, get("/api/users/check-id?userId=kim")).await;
        assert_eq!(body["exists"], true);
        let (_, body) = call(&app, get("/api/users/check-nickname?userNickname=other")).await;
        assert_eq!(body["exists"], false);

        let (status, body) = call(
            &app,
            json_request("POST", "/api/users/login", serde_json::json!({"userId": "kim", "userPwd": "pw"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tokenType"], "Bearer");
        assert_eq!(body["user"]["userNickname"], "kimmy");

        let (status, body) = call(
            &app,
            json_request("POST", "/api/users/login", serde_json::json!({"userId": "kim", "userPwd": "bad"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn register_without_verification_is_400() {
        let (app, _) = app();
        let (status, _) = call(
            &app,
            json_request(
                "POST",
                "/api/users/register",
                serde_json::json!({
                    "userId": "kim",
                    "userPwd": "pw",
                    "userName": "Kim",
                    "userNickname": "kimmy",
                    "userEmail": "kim@example.com"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn profile_endpoints() {
        let (svc, mailer) = testutil::service();
        testutil::registered(&svc, &mailer, "kim");
        let app = build_router(svc);

        let (status, body) = call(&app, get("/api/users/kim")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userNickname"], "kim_nick");

        let (status, body) = call(
            &app,
            as_user(
                json_request("PATCH", "/api/users/kim", serde_json::json!({"userName": "Kim Two"})),
                "kim",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userName"], "Kim Two");

        let (status, _) = call(
            &app,
            as_user(
                json_request("PUT", "/api/users/kim/fcm-token", serde_json::json!({"token": "t1"})),
                "kim",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = call(
            &app,
            as_user(
                json_request("PUT", "/api/users/kim/password", serde_json::json!({"userPwd": "next"})),
                "kim",
            ),
        )
        .await;
        assert_eq!(body["updated"], true);

        let delete = Request::builder()
            .method("DELETE")
            .uri("/api/users/kim")
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(&app, as_user(delete, "kim")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = call(&app, get("/api/users/kim")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn writes_on_another_account_are_forbidden() {
        let (svc, mailer) = testutil::service();
        testutil::registered(&svc, &mailer, "kim");
        testutil::registered(&svc, &mailer, "lee");
        let app = build_router(svc.clone());

        let delete = Request::builder()
            .method("DELETE")
            .uri("/api/users/lee")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(&app, as_user(delete, "kim")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "PERMISSION_DENIED");

        for req in [
            json_request("PATCH", "/api/users/lee", serde_json::json!({"userName": "taken over"})),
            json_request("PUT", "/api/users/lee/password", serde_json::json!({"userPwd": "owned"})),
            json_request("PUT", "/api/users/lee/fcm-token", serde_json::json!({"token": "t"})),
        ] {
            let (status, _) = call(&app, as_user(req, "kim")).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
        }

        let lee = svc.get_user("lee").unwrap();
        assert_eq!(lee.user_name, "lee name");
        assert!(lee.fcm_token.is_none());
    }

    #[tokio::test]
    async fn password_reset_over_http() {
        let (svc, mailer) = testutil::service();
        testutil::registered(&svc, &mailer, "kim");
        let app = build_router(svc);

        let (_, body) = call(
            &app,
            json_request(
                "POST",
                "/api/users/password-reset",
                serde_json::json!({"userId": "kim", "userEmail": "kim@example.com"}),
            ),
        )
        .await;
        assert_eq!(body["sent"], true);

        let mail = mailer.last_to("kim@example.com").unwrap();
        let token = mail.split("token=").nth(1).unwrap().trim().to_string();

        let (status, body) = call(&app, get(&format!("/api/users/password-reset/{}", token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userId"], "kim");

        let (_, body) = call(
            &app,
            json_request(
                "POST",
                "/api/users/password-reset/confirm",
                serde_json::json!({"token": token, "userPwd": "fresh"}),
            ),
        )
        .await;
        assert_eq!(body["reset"], true);

        let (status, _) = call(&app, get(&format!("/api/users/password-reset/{}", token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
