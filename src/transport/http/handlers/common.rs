use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::crypto::password::{hash_password, verify_password};
use crate::crypto::token::TokenError;
use crate::domain::User;
use crate::transport::http::error::ApiError;
use crate::transport::http::types::{AppState, LoginRequest, RegisterRequest};

/// The authenticated caller, resolved from `Authorization: Bearer <jwt>`.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub user_id: i64,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

        let claims = state.tokens.verify(token).map_err(|err| match err {
            TokenError::Expired => ApiError::Unauthorized("Token has expired".to_string()),
            TokenError::Invalid => {
                ApiError::Unauthorized("Could not validate credentials".to_string())
            }
        })?;

        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| ApiError::Unauthorized("Could not validate credentials".to_string()))?;

        Ok(CurrentUser { user_id })
    }
}

/// Validates and stores a new user. Conflicts are checked email first so the
/// reported detail is deterministic when both fields collide.
pub async fn register_user(state: &AppState, request: &RegisterRequest) -> Result<User, ApiError> {
    let email = request.email.trim();
    let username = request.username.trim();
    let password = request.password.as_str();

    require_non_empty("email", email)?;
    require_non_empty("username", username)?;
    require_non_empty("password", password.trim())?;

    if state.db_service.get_user_by_email(email).await?.is_some() {
        tracing::info!(email, "registration rejected: email already registered");
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }
    if state
        .db_service
        .get_user_by_username(username)
        .await?
        .is_some()
    {
        tracing::info!(username, "registration rejected: username already taken");
        return Err(ApiError::Conflict("Username already taken".to_string()));
    }

    let hashed = hash_password(password)?;
    let user = state.db_service.create_user(email, username, &hashed).await?;
    tracing::info!(user_id = user.id, username, "registered new user");
    Ok(user)
}

/// Resolves a login body to the matching active user. Lookup tries the
/// identity as an email first, then as a username. `bad_credentials` is the
/// 401 detail, which differs between the two login surfaces.
pub async fn authenticate(
    state: &AppState,
    request: &LoginRequest,
    bad_credentials: &str,
) -> Result<User, ApiError> {
    let identity = request.username_or_email.trim();

    let user = match state.db_service.get_user_by_email(identity).await? {
        Some(user) => Some(user),
        None => state.db_service.get_user_by_username(identity).await?,
    };

    let user = match user {
        Some(user) => user,
        None => {
            tracing::info!(identity, "login rejected: unknown identity");
            return Err(ApiError::Unauthorized(bad_credentials.to_string()));
        }
    };

    if !verify_password(&request.password, &user.hashed_password) {
        tracing::info!(user_id = user.id, "login rejected: password mismatch");
        return Err(ApiError::Unauthorized(bad_credentials.to_string()));
    }

    // Inactive accounts with a wrong password still get the 401 above.
    if !user.is_active {
        tracing::info!(user_id = user.id, "login rejected: inactive account");
        return Err(ApiError::Forbidden("User account is inactive".to_string()));
    }

    Ok(user)
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}
