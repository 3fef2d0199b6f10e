//! The persistence service.
//!
//! This module is the only place SQL lives. It is responsible for:
//! 1.  Connecting the SQLite pool and creating the schema on startup.
//! 2.  User rows: insert on registration, lookups by id/email/username.
//! 3.  Calculation rows: the full BREAD set with id-ordered pagination.
//!
//! Every request-scoped query checks a connection out of the pool and
//! returns it on all exit paths; there is no other shared state.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use crate::domain::{Calculation, Operation, User};
use crate::infra::config;

/// The main service that manages database interaction.
pub struct DatabaseService {
    pool: SqlitePool,
}

impl DatabaseService {
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Connects using `DATABASE_URL` and creates the schema.
    pub async fn new() -> Result<Self, anyhow::Error> {
        dotenv::dotenv().ok();
        let database_url = config::database_url();
        let pool = connect_pool(&database_url).await?;
        Self::new_with_pool(pool).await
    }

    /// Wraps an existing pool (tests hand in an in-memory one) and creates
    /// the schema.
    pub async fn new_with_pool(pool: SqlitePool) -> Result<Self, anyhow::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                username TEXT NOT NULL UNIQUE,
                hashed_password TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT 1
            )",
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS calculations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                a REAL NOT NULL,
                b REAL NOT NULL,
                op TEXT NOT NULL,
                result REAL NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    // --- Users ---

    /// Inserts a new active user. The handler has already replaced the
    /// password with its hash; uniqueness violations surface as errors
    /// (conflict checks run before this point).
    pub async fn create_user(
        &self,
        email: &str,
        username: &str,
        hashed_password: &str,
    ) -> anyhow::Result<User> {
        let row = sqlx::query(
            "INSERT INTO users (email, username, hashed_password, is_active)
             VALUES (?, ?, ?, ?)
             RETURNING id, email, username, hashed_password, is_active",
        )
        .bind(email)
        .bind(username)
        .bind(hashed_password)
        .bind(true)
        .fetch_one(&self.pool)
        .await?;
        row_to_user(&row)
    }

    pub async fn get_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, username, hashed_password, is_active FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    pub async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, username, hashed_password, is_active FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    pub async fn get_user_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, username, hashed_password, is_active FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    // --- Calculations ---

    /// Persists a calculation. `result` has already been derived and
    /// validated against the operands.
    pub async fn create_calculation(
        &self,
        a: f64,
        b: f64,
        op: Operation,
        result: f64,
    ) -> anyhow::Result<Calculation> {
        let row = sqlx::query(
            "INSERT INTO calculations (a, b, op, result) VALUES (?, ?, ?, ?)
             RETURNING id, a, b, op, result",
        )
        .bind(a)
        .bind(b)
        .bind(op.as_str())
        .bind(result)
        .fetch_one(&self.pool)
        .await?;
        row_to_calculation(&row)
    }

    pub async fn get_calculation(&self, id: i64) -> anyhow::Result<Option<Calculation>> {
        let row = sqlx::query("SELECT id, a, b, op, result FROM calculations WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_calculation).transpose()
    }

    /// Lists calculations in id order. Negative skip/limit clamp to zero;
    /// a skip past the end yields an empty page.
    pub async fn list_calculations(&self, skip: i64, limit: i64) -> anyhow::Result<Vec<Calculation>> {
        let rows = sqlx::query(
            "SELECT id, a, b, op, result FROM calculations ORDER BY id ASC LIMIT ? OFFSET ?",
        )
        .bind(limit.max(0))
        .bind(skip.max(0))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_calculation).collect()
    }

    /// Replaces operands/operation and the recomputed result, keeping the id.
    /// Returns `None` when the id does not exist.
    pub async fn update_calculation(
        &self,
        id: i64,
        a: f64,
        b: f64,
        op: Operation,
        result: f64,
    ) -> anyhow::Result<Option<Calculation>> {
        let row = sqlx::query(
            "UPDATE calculations SET a = ?, b = ?, op = ?, result = ? WHERE id = ?
             RETURNING id, a, b, op, result",
        )
        .bind(a)
        .bind(b)
        .bind(op.as_str())
        .bind(result)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_calculation).transpose()
    }

    /// Returns `true` when a row was removed.
    pub async fn delete_calculation(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM calculations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Opens a pool for `database_url`. In-memory databases are pinned to a
/// single connection: every sqlite `:memory:` connection is a distinct
/// database, so a wider pool would scatter the schema.
async fn connect_pool(database_url: &str) -> anyhow::Result<SqlitePool> {
    let options = if database_url.contains(":memory:") || database_url.contains("mode=memory") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };
    Ok(options.connect(database_url).await?)
}

fn row_to_user(row: &SqliteRow) -> anyhow::Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        hashed_password: row.try_get("hashed_password")?,
        is_active: row.try_get("is_active")?,
    })
}

fn row_to_calculation(row: &SqliteRow) -> anyhow::Result<Calculation> {
    let op_text: String = row.try_get("op")?;
    let op = Operation::parse(&op_text)
        .ok_or_else(|| anyhow::anyhow!("Unknown operation '{}' in calculations row", op_text))?;
    Ok(Calculation {
        id: row.try_get("id")?,
        a: row.try_get("a")?,
        b: row.try_get("b")?,
        op,
        result: row.try_get("result")?,
    })
}
