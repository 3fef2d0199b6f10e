// src/bin/api_server.rs

use std::sync::Arc;

use axum::routing::get;
use axum::Json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

use calculator_api::infra::config;
use calculator_api::transport;
use calculator_api::DatabaseService;
use calculator_api::TokenService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("initializing database service");
    let db_service = DatabaseService::new().await?;

    let app_state = transport::http::AppState {
        db_service: Arc::new(db_service),
        tokens: Arc::new(TokenService::from_env()),
    };

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);
    let app = transport::http::create_router(app_state)
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(transport::http::ApiDoc::openapi()) }),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = config::bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "API server listening");

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received, stopping server");
        }
    }

    Ok(())
}
