//! Route registration: module routes plus system endpoints, behind the
//! bearer token middleware.

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;

use account::service::AccountService;

use crate::auth_middleware;

/// Build the complete router. Module routers carry absolute `/api` paths.
pub fn build_router(accounts: Arc<AccountService>, module_routes: Vec<(&str, Router)>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    for (name, router) in module_routes {
        tracing::debug!(module = %name, "mounting routes");
        app = app.merge(router);
    }

    app.layer(middleware::from_fn_with_state(
        accounts,
        auth_middleware::auth_middleware,
    ))
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "recharged",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
