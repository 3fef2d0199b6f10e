use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::domain::{Calculation, ComputeError};
use crate::transport::http::error::ApiError;
use crate::transport::http::handlers::common::CurrentUser;
use crate::transport::http::types::{
    json_422, path_422, query_422, AppState, CalculationRequest, ListParams,
};

/// Derives the result for a request, rejecting division by zero before
/// anything touches the store.
fn computed(request: &CalculationRequest) -> Result<f64, ApiError> {
    request
        .op
        .compute(request.a, request.b)
        .map_err(|err| match err {
            ComputeError::DivisionByZero => ApiError::Validation(err.to_string()),
        })
}

#[utoipa::path(
    post,
    path = "/calculations/",
    request_body = CalculationRequest,
    responses(
        (status = 201, description = "Calculation stored", body = Calculation),
        (status = 401, description = "Missing, invalid or expired bearer token"),
        (status = 422, description = "Malformed body, unknown type, or division by zero")
    )
)]
pub async fn create_calculation_handler(
    State(state): State<AppState>,
    _current: CurrentUser,
    payload: Result<Json<CalculationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Calculation>), ApiError> {
    let Json(request) = payload.map_err(json_422)?;
    let result = computed(&request)?;
    let stored = state
        .db_service
        .create_calculation(request.a, request.b, request.op, result)
        .await?;
    tracing::debug!(id = stored.id, "stored calculation");
    Ok((StatusCode::CREATED, Json(stored)))
}

#[utoipa::path(
    get,
    path = "/calculations/",
    params(ListParams),
    responses(
        (status = 200, description = "Calculations in id order", body = [Calculation]),
        (status = 401, description = "Missing, invalid or expired bearer token")
    )
)]
pub async fn list_calculations_handler(
    State(state): State<AppState>,
    _current: CurrentUser,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Calculation>>, ApiError> {
    let Query(params) = params.map_err(query_422)?;
    let calculations = state
        .db_service
        .list_calculations(params.skip, params.limit)
        .await?;
    Ok(Json(calculations))
}

#[utoipa::path(
    get,
    path = "/calculations/{id}",
    params(("id" = i64, Path, description = "Calculation id")),
    responses(
        (status = 200, description = "The calculation", body = Calculation),
        (status = 401, description = "Missing, invalid or expired bearer token"),
        (status = 404, description = "No calculation with this id")
    )
)]
pub async fn get_calculation_handler(
    State(state): State<AppState>,
    _current: CurrentUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Calculation>, ApiError> {
    let Path(id) = id.map_err(path_422)?;
    let calculation = state
        .db_service
        .get_calculation(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Calculation not found".to_string()))?;
    Ok(Json(calculation))
}

#[utoipa::path(
    put,
    path = "/calculations/{id}",
    params(("id" = i64, Path, description = "Calculation id")),
    request_body = CalculationRequest,
    responses(
        (status = 200, description = "Updated calculation", body = Calculation),
        (status = 401, description = "Missing, invalid or expired bearer token"),
        (status = 404, description = "No calculation with this id"),
        (status = 422, description = "Malformed body, unknown type, or division by zero")
    )
)]
pub async fn update_calculation_handler(
    State(state): State<AppState>,
    _current: CurrentUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CalculationRequest>, JsonRejection>,
) -> Result<Json<Calculation>, ApiError> {
    let Path(id) = id.map_err(path_422)?;
    let Json(request) = payload.map_err(json_422)?;
    // Validation runs before the existence check, so a divide-by-zero on a
    // missing id reports 422, not 404.
    let result = computed(&request)?;
    let updated = state
        .db_service
        .update_calculation(id, request.a, request.b, request.op, result)
        .await?
        .ok_or_else(|| ApiError::NotFound("Calculation not found".to_string()))?;
    tracing::debug!(id = updated.id, "updated calculation");
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/calculations/{id}",
    params(("id" = i64, Path, description = "Calculation id")),
    responses(
        (status = 204, description = "Calculation removed"),
        (status = 401, description = "Missing, invalid or expired bearer token"),
        (status = 404, description = "No calculation with this id")
    )
)]
pub async fn delete_calculation_handler(
    State(state): State<AppState>,
    _current: CurrentUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id.map_err(path_422)?;
    if state.db_service.delete_calculation(id).await? {
        tracing::debug!(id, "deleted calculation");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Calculation not found".to_string()))
    }
}
