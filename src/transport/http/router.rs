use crate::domain::{Calculation, Operation, PublicUser};
use crate::transport::http::handlers::{auth, calculations, health, users};
use crate::transport::http::types::{
    AppState, CalculationRequest, LoginRequest, RegisterRequest, TokenResponse, UserLoginResponse,
};
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::root_handler,
        health::healthcheck_handler,
        auth::register_handler,
        auth::login_handler,
        users::create_user_handler,
        users::login_user_handler,
        users::me_handler,
        calculations::create_calculation_handler,
        calculations::list_calculations_handler,
        calculations::get_calculation_handler,
        calculations::update_calculation_handler,
        calculations::delete_calculation_handler
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        TokenResponse,
        UserLoginResponse,
        CalculationRequest,
        Calculation,
        Operation,
        PublicUser
    ))
)]
#[allow(dead_code)]
pub struct ApiDoc;

pub fn create_router(app_state: AppState) -> Router {
    // Collection routes answer with and without the trailing slash; axum
    // does not redirect between the two forms.
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::healthcheck_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/users/register", post(users::create_user_handler))
        .route("/users/login", post(users::login_user_handler))
        .route("/users/me", get(users::me_handler))
        .route(
            "/calculations",
            post(calculations::create_calculation_handler)
                .get(calculations::list_calculations_handler),
        )
        .route(
            "/calculations/",
            post(calculations::create_calculation_handler)
                .get(calculations::list_calculations_handler),
        )
        .route(
            "/calculations/:id",
            get(calculations::get_calculation_handler)
                .put(calculations::update_calculation_handler)
                .delete(calculations::delete_calculation_handler),
        )
        .with_state(app_state)
}
