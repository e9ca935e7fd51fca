//! Idempotency ledger: durable proof that a (key, user) pair has already
//! produced a specific transaction. The UNIQUE (key, user_id) constraint
//! is the only concurrency control the commit endpoint relies on.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::{Sqlite, Transaction};

/// Transaction id previously committed under this (key, user), if any.
pub async fn find_transaction_id(
    pool: &SqlitePool,
    key: &str,
    user_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT transaction_id FROM idempotency_record WHERE key = ? AND user_id = ?",
    )
    .bind(key)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Insert a ledger row inside the same database transaction that created
/// its budget transaction. A unique violation here means a concurrent
/// request with the same key won the race.
pub async fn insert_record(
    db_tx: &mut Transaction<'_, Sqlite>,
    id: &str,
    key: &str,
    user_id: &str,
    transaction_id: &str,
    created_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO idempotency_record (id, key, user_id, transaction_id, created_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(key)
    .bind(user_id)
    .bind(transaction_id)
    .bind(created_at)
    .execute(&mut **db_tx)
    .await?;

    Ok(())
}

/// Total ledger rows, optionally for one user.
pub async fn count(pool: &SqlitePool, user_id: Option<&str>) -> Result<i64, sqlx::Error> {
    match user_id {
        Some(uid) => {
            sqlx::query_scalar("SELECT COUNT(*) FROM idempotency_record WHERE user_id = ?")
                .bind(uid)
                .fetch_one(pool)
                .await
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(*) FROM idempotency_record")
                .fetch_one(pool)
                .await
        }
    }
}
