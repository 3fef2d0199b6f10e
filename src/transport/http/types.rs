use crate::app::database_service::DatabaseService;
use crate::crypto::token::TokenService;
use crate::domain::{Operation, PublicUser};
use crate::transport::http::error::ApiError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

#[derive(Clone)]
pub struct AppState {
    pub db_service: Arc<DatabaseService>,
    pub tokens: Arc<TokenService>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct UserLoginResponse {
    pub message: String,
    pub user: PublicUser,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct CalculationRequest {
    pub a: f64,
    pub b: f64,
    #[serde(rename = "type")]
    pub op: Operation,
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct ListParams {
    /// Rows to skip from the start of the id-ordered listing.
    #[serde(default)]
    pub skip: i64,
    /// Maximum number of rows to return.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

/// Folds a body that axum could not deserialize into the 422 contract.
pub fn json_422(rejection: JsonRejection) -> ApiError {
    ApiError::Validation(rejection.body_text())
}

/// Same contract for a query string that failed to deserialize.
pub fn query_422(rejection: QueryRejection) -> ApiError {
    ApiError::Validation(rejection.body_text())
}

/// Same contract for a path parameter that failed to deserialize.
pub fn path_422(rejection: PathRejection) -> ApiError {
    ApiError::Validation(rejection.body_text())
}
