//! Centralized configuration (environment variables + defaults).

/// Database URL. Defaults to a local SQLite file created on first use.
pub fn database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://calculator.db?mode=rwc".to_string())
}

/// Address the API server binds to.
pub fn bind_addr() -> String {
    std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string())
}

/// HMAC secret used to sign access tokens.
///
/// Falls back to a development-only value so local runs and tests work out
/// of the box; real deployments must set `JWT_SECRET`.
pub fn jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("JWT_SECRET not set, using development default");
        "dev-secret-change-me".to_string()
    })
}

/// Access token lifetime in minutes.
pub fn jwt_expire_minutes() -> i64 {
    std::env::var("JWT_EXPIRE_MINUTES")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(30)
        .max(1)
}
