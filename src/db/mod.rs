use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub mod ledger;
pub mod queue;
pub mod settings;
pub mod transaction;

/// Open a SQLite pool with the settings every database here needs:
/// foreign keys on (ledger rows cascade with their transaction) and a busy
/// timeout so concurrent writers wait instead of failing.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    // A pooled `:memory:` database is a different database per connection;
    // pin those to a single connection.
    let pool_options = if database_url.contains(":memory:") {
        SqlitePoolOptions::new().max_connections(1)
    } else {
        SqlitePoolOptions::new()
    };

    pool_options.connect_with(options).await
}

/// Open the authoritative store and create its tables.
pub async fn init_server_db(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = connect(database_url).await?;
    create_server_tables(&pool).await?;
    Ok(pool)
}

/// Open the client-side durable queue database and create its table.
pub async fn init_queue_db(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = connect(database_url).await?;
    create_queue_tables(&pool).await?;
    Ok(pool)
}

async fn create_server_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(
        r#"
        CREATE TABLE IF NOT EXISTS budget_transaction (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            type TEXT NOT NULL,
            amount REAL NOT NULL,
            description TEXT,
            date TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_budget_transaction_user_date
            ON budget_transaction (user_id, date);

        CREATE TABLE IF NOT EXISTS idempotency_record (
            id TEXT PRIMARY KEY,
            key TEXT NOT NULL,
            user_id TEXT NOT NULL,
            transaction_id TEXT NOT NULL UNIQUE
                REFERENCES budget_transaction (id) ON DELETE CASCADE,
            created_at TEXT NOT NULL,
            UNIQUE (key, user_id)
        );

        CREATE TABLE IF NOT EXISTS user_settings (
            user_id TEXT PRIMARY KEY,
            salary_monthly REAL NOT NULL DEFAULT 0,
            saving_goal_monthly REAL,
            currency TEXT NOT NULL DEFAULT 'USD'
        );

        CREATE TABLE IF NOT EXISTS household_settings (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            saving_goal_monthly REAL NOT NULL DEFAULT 0,
            currency TEXT NOT NULL DEFAULT 'USD'
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_queue_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(
        r#"
        CREATE TABLE IF NOT EXISTS queued_transaction (
            local_id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            idempotency_key TEXT NOT NULL,
            payload TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_queued_transaction_user
            ON queued_transaction (user_id, created_at);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
