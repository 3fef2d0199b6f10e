use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::transport::http::error::ApiError;
use crate::transport::http::handlers::common::{authenticate, register_user};
use crate::transport::http::types::{
    json_422, AppState, LoginRequest, RegisterRequest, TokenResponse,
};

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered, token issued", body = TokenResponse),
        (status = 400, description = "Email or username already in use"),
        (status = 422, description = "Malformed body or empty field")
    )
)]
pub async fn register_handler(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let Json(request) = payload.map_err(json_422)?;
    let user = register_user(&state, &request).await?;
    let token = state.tokens.issue(&user.id.to_string(), None)?;
    Ok((StatusCode::CREATED, Json(TokenResponse::bearer(token))))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted, token issued", body = TokenResponse),
        (status = 401, description = "Unknown identity or wrong password"),
        (status = 403, description = "Account is inactive"),
        (status = 422, description = "Malformed body")
    )
)]
pub async fn login_handler(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(request) = payload.map_err(json_422)?;
    let user = authenticate(&state, &request, "Incorrect username/email or password").await?;
    let token = state.tokens.issue(&user.id.to_string(), None)?;
    tracing::info!(user_id = user.id, "login successful, token issued");
    Ok(Json(TokenResponse::bearer(token)))
}
