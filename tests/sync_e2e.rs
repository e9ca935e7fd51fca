//! End-to-end drain scenarios over real queue and store databases, with
//! the in-process API standing in for the server.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tokio::sync::Mutex as AsyncMutex;

use family_budget_sync::api::local::LocalApi;
use family_budget_sync::api::SessionContext;
use family_budget_sync::db;
use family_budget_sync::models::queue::QueuedTransaction;
use family_budget_sync::models::settings::UserSettings;
use family_budget_sync::models::transaction::{Scope, TransactionPayload, TransactionType};
use family_budget_sync::services::projection_service::ProjectionCache;
use family_budget_sync::services::submit_service::{self, SubmitOutcome};
use family_budget_sync::services::summary_service;
use family_budget_sync::services::sync_service::SyncEngine;

struct Harness {
    server: sqlx::SqlitePool,
    queue: sqlx::SqlitePool,
    engine: SyncEngine,
    session: SessionContext,
    _dir: tempfile::TempDir,
}

async fn harness(user_id: &str) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let server_url = format!("sqlite:{}", dir.path().join("server.db").display());
    let queue_url = format!("sqlite:{}", dir.path().join("queue.db").display());

    let server = db::init_server_db(&server_url).await.unwrap();
    let queue = db::init_queue_db(&queue_url).await.unwrap();

    let api = Arc::new(LocalApi::new(server.clone()));
    let engine = SyncEngine::new(
        queue.clone(),
        api.clone(),
        api,
        Arc::new(AsyncMutex::new(ProjectionCache::new())),
    );

    Harness {
        server,
        queue,
        engine,
        session: SessionContext::new(user_id, "token"),
        _dir: dir,
    }
}

async fn seed_member(pool: &sqlx::SqlitePool, user_id: &str, salary: f64, goal: Option<f64>) {
    db::settings::upsert_user_settings(
        pool,
        &UserSettings {
            user_id: user_id.to_string(),
            salary_monthly: salary,
            saving_goal_monthly: goal,
            currency: "USD".to_string(),
        },
    )
    .await
    .unwrap();
}

fn payload(tx_type: TransactionType, amount: f64) -> TransactionPayload {
    TransactionPayload {
        tx_type,
        amount,
        description: None,
        date: Some(Utc.with_ymd_and_hms(2026, 8, 15, 12, 0, 0).unwrap()),
    }
}

fn queued_at(user_id: &str, body: TransactionPayload, minute: u32) -> QueuedTransaction {
    let mut entry = QueuedTransaction::new(user_id, body);
    entry.created_at = Utc.with_ymd_and_hms(2026, 8, 15, 10, minute, 0).unwrap();
    entry
}

#[tokio::test]
async fn queued_entries_commit_in_order_and_land_in_the_summary() {
    let h = harness("mario").await;
    seed_member(&h.server, "mario", 1000.0, Some(100.0)).await;

    // Two entries staged offline: A at 10:00, B at 10:01.
    let a = queued_at("mario", payload(TransactionType::Fixed, 100.0), 0);
    let b = queued_at("mario", payload(TransactionType::Saving, 50.0), 1);
    db::queue::append(&h.queue, &a).await.unwrap();
    db::queue::append(&h.queue, &b).await.unwrap();

    let report = h.engine.drain(&h.session).await.unwrap();
    assert_eq!(report.synced, 2);
    assert_eq!(report.remaining, 0);

    // Committed in enqueue order: A before B.
    let committed = db::transaction::list_for_user(&h.server, "mario").await.unwrap();
    assert_eq!(committed.len(), 2);
    assert_eq!(committed[0].amount, 100.0);
    assert_eq!(committed[0].tx_type, TransactionType::Fixed);
    assert_eq!(committed[1].amount, 50.0);
    assert_eq!(committed[1].tx_type, TransactionType::Saving);
    assert!(committed[0].created_at <= committed[1].created_at);

    // One ledger row per replayed key.
    assert_eq!(db::ledger::count(&h.server, None).await.unwrap(), 2);

    // The authoritative summary shows exactly what was queued.
    let summary = summary_service::month_summary(&h.server, "mario", "2026-08", Scope::Personal)
        .await
        .unwrap();
    assert_eq!(summary.spent_breakdown.fixed, 100.0);
    assert_eq!(summary.saving_total, 50.0);
    assert_eq!(summary.net_total, 1000.0 - 100.0 - 50.0);
    assert_eq!(summary.progress, 50.0);

    // The drain refreshed the projection from the store wholesale.
    let projection = h.engine.projection();
    let projection = projection.lock().await;
    let view = projection.transactions("2026-08", Scope::Personal).unwrap();
    assert_eq!(view.len(), 2);
    assert!(view.iter().all(|row| !row.pending));
    assert_eq!(projection.summary("2026-08", Scope::Personal), Some(&summary));
}

#[tokio::test]
async fn redraining_already_committed_entries_is_harmless() {
    let h = harness("mario").await;
    seed_member(&h.server, "mario", 1000.0, None).await;

    let a = queued_at("mario", payload(TransactionType::Fixed, 100.0), 0);
    db::queue::append(&h.queue, &a).await.unwrap();

    // First drain commits the entry. Re-queue the identical entry under
    // the same idempotency key, as a crashed client that never recorded
    // the removal would.
    h.engine.drain(&h.session).await.unwrap();
    let mut replay = queued_at("mario", payload(TransactionType::Fixed, 100.0), 2);
    replay.idempotency_key = a.idempotency_key.clone();
    db::queue::append(&h.queue, &replay).await.unwrap();

    let report = h.engine.drain(&h.session).await.unwrap();
    assert_eq!(report.synced, 1);
    assert_eq!(report.remaining, 0);

    // Still exactly one committed transaction and one ledger row.
    let committed = db::transaction::list_for_user(&h.server, "mario").await.unwrap();
    assert_eq!(committed.len(), 1);
    assert_eq!(db::ledger::count(&h.server, None).await.unwrap(), 1);
}

#[tokio::test]
async fn invalid_entry_is_dropped_without_blocking_the_rest() {
    let h = harness("mario").await;
    seed_member(&h.server, "mario", 1000.0, None).await;

    let bad = queued_at("mario", payload(TransactionType::Fixed, -5.0), 0);
    let good = queued_at("mario", payload(TransactionType::Saving, 50.0), 1);
    db::queue::append(&h.queue, &bad).await.unwrap();
    db::queue::append(&h.queue, &good).await.unwrap();

    let report = h.engine.drain(&h.session).await.unwrap();
    assert_eq!(report.synced, 1);
    assert_eq!(report.remaining, 0);

    let committed = db::transaction::list_for_user(&h.server, "mario").await.unwrap();
    assert_eq!(committed.len(), 1);
    assert_eq!(committed[0].amount, 50.0);

    // The rejected entry is gone for good, not parked for a retry.
    assert_eq!(db::queue::count(&h.queue, None).await.unwrap(), 0);
}

#[tokio::test]
async fn interactive_submit_commits_and_refreshes_views() {
    let h = harness("mario").await;
    seed_member(&h.server, "mario", 1000.0, Some(100.0)).await;

    let api = LocalApi::new(h.server.clone());
    let projection = AsyncMutex::new(ProjectionCache::new());

    let outcome = submit_service::submit_or_enqueue(
        &h.session,
        &api,
        &api,
        &h.queue,
        &projection,
        payload(TransactionType::Saving, 50.0),
    )
    .await
    .unwrap();

    let SubmitOutcome::Committed(record) = outcome else {
        panic!("expected a direct commit");
    };
    assert_eq!(record.amount, 50.0);
    assert_eq!(db::queue::count(&h.queue, None).await.unwrap(), 0);

    let projection = projection.lock().await;
    let summary = projection.summary("2026-08", Scope::Personal).unwrap();
    assert_eq!(summary.saving_total, 50.0);
    assert_eq!(summary.progress, 50.0);
}
