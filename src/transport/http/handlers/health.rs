use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::transport::http::types::AppState;

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service banner"))
)]
pub async fn root_handler() -> impl IntoResponse {
    Json(json!({ "message": "Calculator API" }))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy (DB reachable)"),
        (status = 503, description = "Service is unhealthy (DB unreachable)")
    )
)]
pub async fn healthcheck_handler(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(state.db_service.pool()).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unhealthy", "detail": format!("DB ping failed: {}", e) })),
        )
            .into_response(),
    }
}
