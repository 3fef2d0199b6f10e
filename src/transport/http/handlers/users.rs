use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::domain::PublicUser;
use crate::transport::http::error::ApiError;
use crate::transport::http::handlers::common::{authenticate, register_user, CurrentUser};
use crate::transport::http::types::{
    json_422, AppState, LoginRequest, RegisterRequest, UserLoginResponse,
};

#[utoipa::path(
    post,
    path = "/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = PublicUser),
        (status = 400, description = "Email or username already in use"),
        (status = 422, description = "Malformed body or empty field")
    )
)]
pub async fn create_user_handler(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let Json(request) = payload.map_err(json_422)?;
    let user = register_user(&state, &request).await?;
    Ok((StatusCode::CREATED, Json(PublicUser::from(user))))
}

#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = UserLoginResponse),
        (status = 401, description = "Unknown identity or wrong password"),
        (status = 403, description = "Account is inactive"),
        (status = 422, description = "Malformed body")
    )
)]
pub async fn login_user_handler(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<UserLoginResponse>, ApiError> {
    let Json(request) = payload.map_err(json_422)?;
    let user = authenticate(&state, &request, "Invalid credentials").await?;
    tracing::info!(user_id = user.id, "login successful");
    Ok(Json(UserLoginResponse {
        message: "Login successful".to_string(),
        user: PublicUser::from(user),
    }))
}

#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "The user behind the bearer token", body = PublicUser),
        (status = 401, description = "Missing, invalid or expired bearer token")
    )
)]
pub async fn me_handler(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state
        .db_service
        .get_user_by_id(current.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Could not validate credentials".to_string()))?;
    Ok(Json(PublicUser::from(user)))
}
