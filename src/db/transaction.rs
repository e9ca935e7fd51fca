//! Authoritative transaction rows.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::{Sqlite, Transaction};

use crate::models::transaction::TransactionRecord;

const SELECT_COLUMNS: &str = "id, user_id, type, amount, description, date, created_at";

/// Insert a transaction row inside an open database transaction, so the
/// caller can pair it atomically with an idempotency record.
pub async fn insert_transaction(
    db_tx: &mut Transaction<'_, Sqlite>,
    record: &TransactionRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO budget_transaction (id, user_id, type, amount, description, date, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&record.id)
    .bind(&record.user_id)
    .bind(record.tx_type)
    .bind(record.amount)
    .bind(&record.description)
    .bind(record.date)
    .bind(record.created_at)
    .execute(&mut **db_tx)
    .await?;

    Ok(())
}

/// Get a transaction by id.
pub async fn get_transaction(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<TransactionRecord>, sqlx::Error> {
    sqlx::query_as::<_, TransactionRecord>(&format!(
        "SELECT {SELECT_COLUMNS} FROM budget_transaction WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// All transactions for a set of users inside a date range, newest first
/// (display order for the month views).
pub async fn list_for_month(
    pool: &SqlitePool,
    user_ids: &[String],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<TransactionRecord>, sqlx::Error> {
    if user_ids.is_empty() {
        return Ok(vec![]);
    }

    // Bind one placeholder per user id.
    let placeholders = vec!["?"; user_ids.len()].join(", ");
    let query_str = format!(
        "SELECT {SELECT_COLUMNS} FROM budget_transaction \
         WHERE user_id IN ({placeholders}) AND date >= ? AND date < ? \
         ORDER BY date DESC, created_at DESC"
    );

    let mut query = sqlx::query_as::<_, TransactionRecord>(&query_str);
    for user_id in user_ids {
        query = query.bind(user_id);
    }
    query = query.bind(start).bind(end);

    query.fetch_all(pool).await
}

/// All transactions for one user in commit order (oldest first).
pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<TransactionRecord>, sqlx::Error> {
    sqlx::query_as::<_, TransactionRecord>(&format!(
        "SELECT {SELECT_COLUMNS} FROM budget_transaction WHERE user_id = ? \
         ORDER BY created_at ASC, rowid ASC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Delete a transaction row. Any idempotency record referencing it
/// cascades away with it.
pub async fn delete_transaction(pool: &SqlitePool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM budget_transaction WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
