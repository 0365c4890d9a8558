use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use recharge_core::ServiceError;

use crate::api::AppState;
use crate::model::{KakaoLoginRequest, LoginRequest, LoginResponse, RegisterUser, User};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/kakao-login", post(kakao_login))
}

async fn register(
    State(svc): State<AppState>,
    Json(input): Json<RegisterUser>,
) -> Result<(StatusCode, Json<User>), ServiceError> {
    let user = svc.register(input).map_err(ServiceError::from)?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(svc): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ServiceError> {
    let resp = svc.login(&input).map_err(ServiceError::from)?;
    Ok(Json(resp))
}

async fn kakao_login(
    State(svc): State<AppState>,
    Json(input): Json<KakaoLoginRequest>,
) -> Result<Json<LoginResponse>, ServiceError> {
    let resp = svc
        .kakao_login(&input.access_token)
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(resp))
}
