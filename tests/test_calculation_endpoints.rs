//! Integration tests for the calculation endpoints: BREAD semantics,
//! validation, pagination, and the bearer-token requirement.

use std::sync::Arc;

use chrono::Duration;
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use calculator_api::{transport, DatabaseService, TokenService};

const TEST_SECRET: &str = "test-secret";

async fn spawn_server() -> Result<(String, SqlitePool), Box<dyn std::error::Error>> {
    // Single pinned connection: every sqlite :memory: connection is its own
    // database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    let db_service = DatabaseService::new_with_pool(pool.clone()).await?;
    let app_state = transport::http::AppState {
        db_service: Arc::new(db_service),
        tokens: Arc::new(TokenService::new(TEST_SECRET, 30)),
    };
    let router = transport::http::create_router(app_state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Ok((format!("http://127.0.0.1:{}", port), pool))
}

/// Registers a throwaway user and returns a usable bearer token.
async fn register_and_token(
    client: &reqwest::Client,
    base_url: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let resp = client
        .post(&format!("{}/auth/register", base_url))
        .json(&json!({
            "email": "calc@example.com",
            "username": "calcuser",
            "password": "Password123"
        }))
        .send()
        .await?;
    let status = resp.status().as_u16();
    let body = resp.json::<serde_json::Value>().await?;
    if status != 201 {
        return Err(format!("registration failed ({}): {}", status, body).into());
    }
    Ok(body["access_token"].as_str().unwrap_or_default().to_string())
}

async fn create_calculation(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    a: f64,
    b: f64,
    op: &str,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let resp = client
        .post(&format!("{}/calculations/", base_url))
        .bearer_auth(token)
        .json(&json!({ "a": a, "b": b, "type": op }))
        .send()
        .await?;
    let status = resp.status().as_u16();
    let body = resp.json::<serde_json::Value>().await?;
    if status != 201 {
        return Err(format!("create failed ({}): {}", status, body).into());
    }
    Ok(body)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn create_computes_result_for_every_operation() -> Result<(), Box<dyn std::error::Error>> {
    let (base_url, _pool) = spawn_server().await?;
    let client = reqwest::Client::new();
    let token = register_and_token(&client, &base_url).await?;

    let cases = [
        ("Add", 10.0, 5.0, 15.0),
        ("Sub", 20.0, 8.0, 12.0),
        ("Multiply", 6.0, 7.0, 42.0),
        ("Divide", 100.0, 4.0, 25.0),
    ];
    for (op, a, b, expected) in cases {
        let body = create_calculation(&client, &base_url, &token, a, b, op).await?;
        assert_eq!(body["type"], op);
        assert_eq!(body["a"].as_f64(), Some(a));
        assert_eq!(body["b"].as_f64(), Some(b));
        assert_eq!(body["result"].as_f64(), Some(expected), "result for {}", op);
        assert!(body["id"].as_i64().unwrap_or_default() > 0);
    }

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn read_single_and_missing() -> Result<(), Box<dyn std::error::Error>> {
    let (base_url, _pool) = spawn_server().await?;
    let client = reqwest::Client::new();
    let token = register_and_token(&client, &base_url).await?;

    let created = create_calculation(&client, &base_url, &token, 10.0, 5.0, "Add").await?;
    let id = created["id"].as_i64().unwrap_or_default();

    let resp = client
        .get(&format!("{}/calculations/{}", base_url, id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 200);
    let body = resp.json::<serde_json::Value>().await?;
    assert_eq!(body["id"].as_i64(), Some(id));
    assert_eq!(body["type"], "Add");
    assert_eq!(body["result"].as_f64(), Some(15.0));

    let resp = client
        .get(&format!("{}/calculations/999999", base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 404);
    let body = resp.json::<serde_json::Value>().await?;
    assert_eq!(body["detail"], "Calculation not found");

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn divide_by_zero_is_rejected_before_storage() -> Result<(), Box<dyn std::error::Error>> {
    let (base_url, pool) = spawn_server().await?;
    let client = reqwest::Client::new();
    let token = register_and_token(&client, &base_url).await?;

    let resp = client
        .post(&format!("{}/calculations/", base_url))
        .bearer_auth(&token)
        .json(&json!({ "a": 10.0, "b": 0.0, "type": "Divide" }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 422);
    let body = resp.json::<serde_json::Value>().await?;
    assert!(body["detail"]
        .as_str()
        .unwrap_or_default()
        .contains("Division by zero"));

    // Nothing was persisted.
    let row = sqlx::query("SELECT COUNT(*) AS n FROM calculations")
        .fetch_one(&pool)
        .await?;
    let n: i64 = row.try_get("n")?;
    assert_eq!(n, 0);

    // A rejected update leaves the stored record untouched.
    let created = create_calculation(&client, &base_url, &token, 9.0, 3.0, "Divide").await?;
    let id = created["id"].as_i64().unwrap_or_default();
    assert_eq!(created["result"].as_f64(), Some(3.0));

    let resp = client
        .put(&format!("{}/calculations/{}", base_url, id))
        .bearer_auth(&token)
        .json(&json!({ "a": 9.0, "b": 0.0, "type": "Divide" }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 422);

    let resp = client
        .get(&format!("{}/calculations/{}", base_url, id))
        .bearer_auth(&token)
        .send()
        .await?;
    let body = resp.json::<serde_json::Value>().await?;
    assert_eq!(body["result"].as_f64(), Some(3.0));
    assert_eq!(body["b"].as_f64(), Some(3.0));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_bodies_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let (base_url, _pool) = spawn_server().await?;
    let client = reqwest::Client::new();
    let token = register_and_token(&client, &base_url).await?;

    // Unknown operation name.
    let resp = client
        .post(&format!("{}/calculations/", base_url))
        .bearer_auth(&token)
        .json(&json!({ "a": 1.0, "b": 2.0, "type": "Power" }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 422);

    // Missing operand.
    let resp = client
        .post(&format!("{}/calculations/", base_url))
        .bearer_auth(&token)
        .json(&json!({ "a": 1.0, "type": "Add" }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 422);

    // Non-numeric operand.
    let resp = client
        .post(&format!("{}/calculations/", base_url))
        .bearer_auth(&token)
        .json(&json!({ "a": "ten", "b": 2.0, "type": "Add" }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 422);

    // None of it reached the store.
    let resp = client
        .get(&format!("{}/calculations/", base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    let body = resp.json::<serde_json::Value>().await?;
    assert_eq!(body.as_array().map(|a| a.len()), Some(0));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_query_and_path_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let (base_url, _pool) = spawn_server().await?;
    let client = reqwest::Client::new();
    let token = register_and_token(&client, &base_url).await?;

    // Non-numeric pagination values still get the structured 422 body.
    let resp = client
        .get(&format!("{}/calculations/?skip=abc", base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 422);
    assert_eq!(
        resp.headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
    let body = resp.json::<serde_json::Value>().await?;
    assert!(body["detail"].as_str().is_some());

    let resp = client
        .get(&format!("{}/calculations/?limit=ten", base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 422);

    // Non-numeric id, on every method that takes one.
    let resp = client
        .get(&format!("{}/calculations/abc", base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 422);
    let body = resp.json::<serde_json::Value>().await?;
    assert!(body["detail"].as_str().is_some());

    let resp = client
        .put(&format!("{}/calculations/abc", base_url))
        .bearer_auth(&token)
        .json(&json!({ "a": 1.0, "b": 2.0, "type": "Add" }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 422);

    let resp = client
        .delete(&format!("{}/calculations/abc", base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 422);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn listing_paginates_in_id_order() -> Result<(), Box<dyn std::error::Error>> {
    let (base_url, _pool) = spawn_server().await?;
    let client = reqwest::Client::new();
    let token = register_and_token(&client, &base_url).await?;

    for i in 1..=10 {
        create_calculation(&client, &base_url, &token, i as f64, 1.0, "Add").await?;
    }

    // Defaults return everything, in id order.
    let resp = client
        .get(&format!("{}/calculations/", base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 200);
    let body = resp.json::<serde_json::Value>().await?;
    let all = body.as_array().cloned().unwrap_or_default();
    assert_eq!(all.len(), 10);
    let ids: Vec<i64> = all.iter().filter_map(|c| c["id"].as_i64()).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);

    // A window into the middle.
    let resp = client
        .get(&format!("{}/calculations/?skip=3&limit=5", base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    let body = resp.json::<serde_json::Value>().await?;
    let page = body.as_array().cloned().unwrap_or_default();
    assert_eq!(page.len(), 5);
    assert_eq!(page[0]["a"].as_f64(), Some(4.0));
    assert_eq!(page[4]["a"].as_f64(), Some(8.0));

    // Past the end is an empty page, not an error.
    let resp = client
        .get(&format!("{}/calculations/?skip=50", base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 200);
    let body = resp.json::<serde_json::Value>().await?;
    assert_eq!(body.as_array().map(|a| a.len()), Some(0));

    // Negative skip clamps to the start.
    let resp = client
        .get(&format!("{}/calculations/?skip=-4", base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    let body = resp.json::<serde_json::Value>().await?;
    assert_eq!(body.as_array().map(|a| a.len()), Some(10));

    // Negative limit clamps to zero rows.
    let resp = client
        .get(&format!("{}/calculations/?limit=-1", base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    let body = resp.json::<serde_json::Value>().await?;
    assert_eq!(body.as_array().map(|a| a.len()), Some(0));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn update_recomputes_and_keeps_id() -> Result<(), Box<dyn std::error::Error>> {
    let (base_url, _pool) = spawn_server().await?;
    let client = reqwest::Client::new();
    let token = register_and_token(&client, &base_url).await?;

    let created = create_calculation(&client, &base_url, &token, 10.0, 5.0, "Add").await?;
    let id = created["id"].as_i64().unwrap_or_default();
    assert_eq!(created["result"].as_f64(), Some(15.0));

    let resp = client
        .put(&format!("{}/calculations/{}", base_url, id))
        .bearer_auth(&token)
        .json(&json!({ "a": 20.0, "b": 4.0, "type": "Multiply" }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 200);
    let body = resp.json::<serde_json::Value>().await?;
    assert_eq!(body["id"].as_i64(), Some(id));
    assert_eq!(body["type"], "Multiply");
    assert_eq!(body["result"].as_f64(), Some(80.0));

    // The new state is what reads return.
    let resp = client
        .get(&format!("{}/calculations/{}", base_url, id))
        .bearer_auth(&token)
        .send()
        .await?;
    let body = resp.json::<serde_json::Value>().await?;
    assert_eq!(body["result"].as_f64(), Some(80.0));

    // Updating a missing id is a 404.
    let resp = client
        .put(&format!("{}/calculations/424242", base_url))
        .bearer_auth(&token)
        .json(&json!({ "a": 1.0, "b": 1.0, "type": "Add" }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 404);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn delete_then_read_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let (base_url, _pool) = spawn_server().await?;
    let client = reqwest::Client::new();
    let token = register_and_token(&client, &base_url).await?;

    let created = create_calculation(&client, &base_url, &token, 2.0, 3.0, "Multiply").await?;
    let id = created["id"].as_i64().unwrap_or_default();

    let resp = client
        .delete(&format!("{}/calculations/{}", base_url, id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 204);
    assert!(resp.text().await?.is_empty());

    let resp = client
        .get(&format!("{}/calculations/{}", base_url, id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 404);

    // Deleting again is also a 404.
    let resp = client
        .delete(&format!("{}/calculations/{}", base_url, id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 404);

    // And the listing is empty again.
    let resp = client
        .get(&format!("{}/calculations/", base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    let body = resp.json::<serde_json::Value>().await?;
    assert_eq!(body.as_array().map(|a| a.len()), Some(0));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn calculation_endpoints_require_bearer_token() -> Result<(), Box<dyn std::error::Error>> {
    let (base_url, _pool) = spawn_server().await?;
    let client = reqwest::Client::new();
    let token = register_and_token(&client, &base_url).await?;

    let created = create_calculation(&client, &base_url, &token, 1.0, 2.0, "Add").await?;
    let id = created["id"].as_i64().unwrap_or_default();

    // Every endpoint rejects an unauthenticated call.
    let unauth = vec![
        client
            .post(&format!("{}/calculations/", base_url))
            .json(&json!({ "a": 1.0, "b": 2.0, "type": "Add" }))
            .send()
            .await?,
        client.get(&format!("{}/calculations/", base_url)).send().await?,
        client
            .get(&format!("{}/calculations/{}", base_url, id))
            .send()
            .await?,
        client
            .put(&format!("{}/calculations/{}", base_url, id))
            .json(&json!({ "a": 1.0, "b": 2.0, "type": "Add" }))
            .send()
            .await?,
        client
            .delete(&format!("{}/calculations/{}", base_url, id))
            .send()
            .await?,
    ];
    for resp in unauth {
        assert_eq!(resp.status().as_u16(), 401);
        assert!(resp.headers().get("www-authenticate").is_some());
    }

    // The unauthenticated delete did not go through.
    let resp = client
        .get(&format!("{}/calculations/{}", base_url, id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 200);

    // Forged and expired tokens are rejected too.
    let forged = TokenService::new("wrong-secret", 30).issue("1", None)?;
    let resp = client
        .get(&format!("{}/calculations/", base_url))
        .bearer_auth(&forged)
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 401);

    let expired = TokenService::new(TEST_SECRET, 30).issue("1", Some(Duration::minutes(-2)))?;
    let resp = client
        .get(&format!("{}/calculations/", base_url))
        .bearer_auth(&expired)
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 401);

    // The real token still works.
    let resp = client
        .get(&format!("{}/calculations/", base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 200);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn collection_routes_answer_without_trailing_slash() -> Result<(), Box<dyn std::error::Error>>
{
    let (base_url, _pool) = spawn_server().await?;
    let client = reqwest::Client::new();
    let token = register_and_token(&client, &base_url).await?;

    let resp = client
        .post(&format!("{}/calculations", base_url))
        .bearer_auth(&token)
        .json(&json!({ "a": 7.0, "b": 3.0, "type": "Sub" }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 201);
    let body = resp.json::<serde_json::Value>().await?;
    assert_eq!(body["result"].as_f64(), Some(4.0));

    for path in ["/calculations", "/calculations/"] {
        let resp = client
            .get(&format!("{}{}", base_url, path))
            .bearer_auth(&token)
            .send()
            .await?;
        assert_eq!(resp.status().as_u16(), 200, "GET {} failed", path);
        let body = resp.json::<serde_json::Value>().await?;
        assert_eq!(body.as_array().map(|a| a.len()), Some(1));
    }

    Ok(())
}
