//! Local durable queue: pending submissions that must survive restarts.
//!
//! Mutating operations return the resulting queue count directly, so
//! callers that surface a "pending" indicator get the new value without
//! any ambient change notification.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;

use crate::models::queue::QueuedTransaction;

/// Persist a new queue entry. Re-appending an existing local id is a
/// no-op. Returns the new pending count for the entry's user.
pub async fn append(pool: &SqlitePool, entry: &QueuedTransaction) -> Result<i64, sqlx::Error> {
    let payload = serde_json::to_string(&entry.payload)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    sqlx::query(
        "INSERT OR IGNORE INTO queued_transaction (local_id, user_id, idempotency_key, payload, created_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&entry.local_id)
    .bind(&entry.user_id)
    .bind(&entry.idempotency_key)
    .bind(&payload)
    .bind(entry.created_at)
    .execute(pool)
    .await?;

    count(pool, Some(&entry.user_id)).await
}

/// Queue snapshot in FIFO order (oldest first), for one user or all.
pub async fn list(
    pool: &SqlitePool,
    user_id: Option<&str>,
) -> Result<Vec<QueuedTransaction>, sqlx::Error> {
    let rows: Vec<(String, String, String, String, DateTime<Utc>)> = match user_id {
        Some(uid) => {
            sqlx::query_as(
                "SELECT local_id, user_id, idempotency_key, payload, created_at \
                 FROM queued_transaction WHERE user_id = ? \
                 ORDER BY created_at ASC, rowid ASC",
            )
            .bind(uid)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as(
                "SELECT local_id, user_id, idempotency_key, payload, created_at \
                 FROM queued_transaction \
                 ORDER BY created_at ASC, rowid ASC",
            )
            .fetch_all(pool)
            .await?
        }
    };

    rows.into_iter()
        .map(|(local_id, user_id, idempotency_key, payload, created_at)| {
            let payload = serde_json::from_str(&payload)
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
            Ok(QueuedTransaction {
                local_id,
                user_id,
                idempotency_key,
                payload,
                created_at,
            })
        })
        .collect()
}

/// Delete a queue entry; absent ids are a no-op. Returns the remaining
/// total count.
pub async fn remove(pool: &SqlitePool, local_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query("DELETE FROM queued_transaction WHERE local_id = ?")
        .bind(local_id)
        .execute(pool)
        .await?;

    count(pool, None).await
}

/// Current queue size, for one user or all.
pub async fn count(pool: &SqlitePool, user_id: Option<&str>) -> Result<i64, sqlx::Error> {
    match user_id {
        Some(uid) => {
            sqlx::query_scalar("SELECT COUNT(*) FROM queued_transaction WHERE user_id = ?")
                .bind(uid)
                .fetch_one(pool)
                .await
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(*) FROM queued_transaction")
                .fetch_one(pool)
                .await
        }
    }
}
