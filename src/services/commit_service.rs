//! Idempotent commit endpoint: creates a transaction and its ledger entry
//! atomically, or returns the one a previous submission already produced.

use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::db;
use crate::error::CommitError;
use crate::models::transaction::{CommitOutcome, TransactionPayload, TransactionRecord};

const MAX_DESCRIPTION_LEN: usize = 280;

fn validate_payload(payload: &TransactionPayload) -> Result<(), CommitError> {
    if !payload.amount.is_finite() || payload.amount <= 0.0 {
        return Err(CommitError::validation("amount", "amount must be positive"));
    }

    if let Some(description) = &payload.description {
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(CommitError::validation(
                "description",
                format!("description must be at most {MAX_DESCRIPTION_LEN} characters"),
            ));
        }
    }

    Ok(())
}

/// Commit a transaction exactly once per (idempotency key, user).
///
/// With a key, a prior commit under the same (key, user) is returned as-is
/// with `duplicated = true`, no matter what the retried payload says. A
/// fresh commit inserts the transaction row and the ledger row as one
/// atomic unit; losing a concurrent race on the key resolves to the
/// winner's transaction instead of an error.
pub async fn commit_transaction(
    pool: &SqlitePool,
    user_id: &str,
    payload: &TransactionPayload,
    idempotency_key: Option<&str>,
) -> Result<CommitOutcome, CommitError> {
    validate_payload(payload)?;

    let key = idempotency_key.map(str::trim).filter(|k| !k.is_empty());

    if let Some(key) = key {
        if let Some(existing) = replay_existing(pool, key, user_id).await? {
            debug!(key, user_id, "idempotent replay, returning existing transaction");
            return Ok(CommitOutcome {
                transaction: existing,
                duplicated: true,
            });
        }
    }

    let record = TransactionRecord {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        tx_type: payload.tx_type,
        amount: payload.amount,
        description: payload.description.clone(),
        date: payload.date.unwrap_or_else(Utc::now),
        created_at: Utc::now(),
    };

    let mut db_tx = pool.begin().await?;
    db::transaction::insert_transaction(&mut db_tx, &record).await?;

    if let Some(key) = key {
        let ledger_id = Uuid::new_v4().to_string();
        if let Err(err) =
            db::ledger::insert_record(&mut db_tx, &ledger_id, key, user_id, &record.id, record.created_at)
                .await
        {
            if is_unique_violation(&err) {
                // Lost the race: a concurrent request with the same key
                // committed first. Roll back and answer with the winner.
                db_tx.rollback().await.ok();
                let existing = replay_existing(pool, key, user_id).await?.ok_or_else(|| {
                    CommitError::Server("idempotency record vanished after conflict".to_string())
                })?;
                debug!(key, user_id, "idempotency conflict, resolved to existing transaction");
                return Ok(CommitOutcome {
                    transaction: existing,
                    duplicated: true,
                });
            }
            return Err(err.into());
        }
    }

    db_tx.commit().await?;

    Ok(CommitOutcome {
        transaction: record,
        duplicated: false,
    })
}

/// Delete an owned transaction. The idempotency record cascades with it,
/// so the same key can commit again afterwards.
pub async fn delete_transaction(
    pool: &SqlitePool,
    user_id: &str,
    transaction_id: &str,
) -> Result<(), CommitError> {
    let existing = db::transaction::get_transaction(pool, transaction_id)
        .await?
        .ok_or_else(|| CommitError::validation("id", "transaction not found"))?;

    if existing.user_id != user_id {
        return Err(CommitError::Authorization(
            "only the owner can delete this transaction".to_string(),
        ));
    }

    db::transaction::delete_transaction(pool, transaction_id).await?;
    Ok(())
}

async fn replay_existing(
    pool: &SqlitePool,
    key: &str,
    user_id: &str,
) -> Result<Option<TransactionRecord>, CommitError> {
    let Some(transaction_id) = db::ledger::find_transaction_id(pool, key, user_id).await? else {
        return Ok(None);
    };

    let transaction = db::transaction::get_transaction(pool, &transaction_id)
        .await?
        .ok_or_else(|| {
            CommitError::Server(format!(
                "ledger references missing transaction {transaction_id}"
            ))
        })?;

    Ok(Some(transaction))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
