//! Interactive submission path: try the server directly, and when it
//! cannot be reached, fall back to the durable queue. The user is told
//! the item was saved either way; only genuine rejections surface.

use sqlx::sqlite::SqlitePool;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

use crate::api::{CommitApi, ReadApi, SessionContext};
use crate::db;
use crate::error::CommitError;
use crate::models::queue::QueuedTransaction;
use crate::models::transaction::{TransactionPayload, TransactionRecord};
use crate::services::projection_service::ProjectionCache;
use crate::utils::month;

/// How an interactive submission ended up saved.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Committed directly on the server.
    Committed(TransactionRecord),
    /// Staged in the local queue for a later drain; `pending` is the new
    /// queue count for the user.
    Queued { local_id: String, pending: i64 },
}

/// Submit a transaction, falling back to the queue when the server is
/// unreachable. Validation and authorization errors are returned to the
/// caller; transient server errors (5xx) are too, since the user can
/// simply retry an interactive submission.
pub async fn submit_or_enqueue(
    session: &SessionContext,
    commit_api: &dyn CommitApi,
    read_api: &dyn ReadApi,
    queue: &SqlitePool,
    projection: &AsyncMutex<ProjectionCache>,
    payload: TransactionPayload,
) -> Result<SubmitOutcome, CommitError> {
    match commit_api.submit(session, &payload, None).await {
        Ok(outcome) => {
            let month_key = month::month_of(&outcome.transaction.date);
            let mut projection = projection.lock().await;
            projection.invalidate(&month_key);
            if let Err(err) = projection.refresh(session, read_api, &month_key).await {
                warn!(month = %month_key, error = %err, "failed to refresh views after commit");
            }
            Ok(SubmitOutcome::Committed(outcome.transaction))
        }
        Err(CommitError::Network(reason)) => {
            info!(%reason, "server unreachable, staging transaction in local queue");

            let entry = QueuedTransaction::new(&session.user_id, payload);
            let pending = db::queue::append(queue, &entry).await?;
            projection
                .lock()
                .await
                .merge_pending(&session.user_id, &entry.payload, &entry.local_id);

            Ok(SubmitOutcome::Queued {
                local_id: entry.local_id,
                pending,
            })
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::summary::Summary;
    use crate::models::transaction::{CommitOutcome, Scope, TransactionType};

    struct DownApi;

    #[async_trait]
    impl CommitApi for DownApi {
        async fn submit(
            &self,
            _session: &SessionContext,
            _payload: &TransactionPayload,
            _idempotency_key: Option<&str>,
        ) -> Result<CommitOutcome, CommitError> {
            Err(CommitError::Network("connection refused".to_string()))
        }
    }

    struct RejectingApi;

    #[async_trait]
    impl CommitApi for RejectingApi {
        async fn submit(
            &self,
            _session: &SessionContext,
            _payload: &TransactionPayload,
            _idempotency_key: Option<&str>,
        ) -> Result<CommitOutcome, CommitError> {
            Err(CommitError::validation("amount", "amount must be positive"))
        }
    }

    struct EmptyReadApi;

    #[async_trait]
    impl ReadApi for EmptyReadApi {
        async fn fetch_transactions(
            &self,
            _session: &SessionContext,
            _month: &str,
            _scope: Scope,
        ) -> Result<Vec<TransactionRecord>, CommitError> {
            Ok(vec![])
        }

        async fn fetch_summary(
            &self,
            _session: &SessionContext,
            _month: &str,
            _scope: Scope,
        ) -> Result<Summary, CommitError> {
            Ok(Summary::new(0.0, 0.0))
        }
    }

    fn payload() -> TransactionPayload {
        TransactionPayload {
            tx_type: TransactionType::Saving,
            amount: 50.0,
            description: Some("ahorro".to_string()),
            date: Some(Utc.with_ymd_and_hms(2026, 8, 15, 12, 0, 0).unwrap()),
        }
    }

    #[tokio::test]
    async fn test_network_failure_queues_and_projects() {
        let queue = crate::db::init_queue_db("sqlite::memory:").await.unwrap();
        let projection = AsyncMutex::new(ProjectionCache::new());
        let session = SessionContext::new("mario", "token");

        let outcome = submit_or_enqueue(
            &session,
            &DownApi,
            &EmptyReadApi,
            &queue,
            &projection,
            payload(),
        )
        .await
        .unwrap();

        let SubmitOutcome::Queued { local_id, pending } = outcome else {
            panic!("expected a queued outcome");
        };
        assert_eq!(pending, 1);

        // Durably staged with an idempotency key for the replay.
        let entries = db::queue::list(&queue, Some("mario")).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].local_id, local_id);
        assert!(!entries[0].idempotency_key.is_empty());

        // And immediately visible as a pending row.
        let projection = projection.lock().await;
        let view = projection.transactions("2026-08", Scope::Personal).unwrap();
        assert!(view[0].pending);
        assert_eq!(view[0].amount, 50.0);
    }

    #[tokio::test]
    async fn test_rejection_surfaces_and_queues_nothing() {
        let queue = crate::db::init_queue_db("sqlite::memory:").await.unwrap();
        let projection = AsyncMutex::new(ProjectionCache::new());
        let session = SessionContext::new("mario", "token");

        let err = submit_or_enqueue(
            &session,
            &RejectingApi,
            &EmptyReadApi,
            &queue,
            &projection,
            payload(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CommitError::Validation { .. }));
        assert_eq!(db::queue::count(&queue, None).await.unwrap(), 0);
    }

    // The committed path is covered end to end in tests/sync_e2e.rs,
    // where a real store backs the refresh.
}
