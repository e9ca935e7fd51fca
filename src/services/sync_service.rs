//! Sync engine: replays the local durable queue against the commit
//! endpoint, strictly in order, one drain at a time per user.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use sqlx::sqlite::SqlitePool;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::api::{CommitApi, ReadApi, SessionContext};
use crate::db;
use crate::models::queue::QueuedTransaction;
use crate::services::projection_service::ProjectionCache;
use crate::utils::month;

/// Aggregate result of one drain pass. Per-entry errors never reach the
/// caller; this report is the engine's whole surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub synced: usize,
    pub remaining: usize,
}

pub struct SyncEngine {
    queue: SqlitePool,
    commit_api: Arc<dyn CommitApi>,
    read_api: Arc<dyn ReadApi>,
    projection: Arc<AsyncMutex<ProjectionCache>>,
    in_flight: Mutex<HashSet<String>>,
}

impl SyncEngine {
    pub fn new(
        queue: SqlitePool,
        commit_api: Arc<dyn CommitApi>,
        read_api: Arc<dyn ReadApi>,
        projection: Arc<AsyncMutex<ProjectionCache>>,
    ) -> Self {
        Self {
            queue,
            commit_api,
            read_api,
            projection,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn projection(&self) -> Arc<AsyncMutex<ProjectionCache>> {
        self.projection.clone()
    }

    /// One drain pass for the session's user: snapshot the queue oldest
    /// first and submit entries one at a time under their stored
    /// idempotency keys. Success and terminal rejection both remove the
    /// entry; the first transient failure halts the pass with the rest of
    /// the queue intact and in order. Concurrent triggers for the same
    /// user coalesce into the running pass instead of stacking.
    pub async fn drain(&self, session: &SessionContext) -> Result<DrainReport, sqlx::Error> {
        let _guard = match DrainGuard::acquire(&self.in_flight, &session.user_id) {
            Some(guard) => guard,
            None => {
                debug!(user_id = %session.user_id, "drain already in flight, coalescing");
                let remaining = db::queue::count(&self.queue, Some(&session.user_id)).await? as usize;
                return Ok(DrainReport { synced: 0, remaining });
            }
        };

        let snapshot = db::queue::list(&self.queue, Some(&session.user_id)).await?;
        let mut synced = 0usize;
        let mut touched_months: Vec<String> = Vec::new();

        for entry in &snapshot {
            match self
                .commit_api
                .submit(session, &entry.payload, Some(&entry.idempotency_key))
                .await
            {
                Ok(outcome) => {
                    if outcome.duplicated {
                        debug!(local_id = %entry.local_id, "entry already committed server-side");
                    }
                    db::queue::remove(&self.queue, &entry.local_id).await?;
                    synced += 1;
                    note_month(&mut touched_months, entry);
                }
                Err(err) if err.is_transient() => {
                    info!(
                        local_id = %entry.local_id,
                        error = %err,
                        "transient failure, halting drain"
                    );
                    break;
                }
                Err(err) => {
                    // Deliberate data-loss policy: a terminal rejection
                    // drops the entry for good. This log line is the only
                    // trace it leaves.
                    warn!(
                        local_id = %entry.local_id,
                        tx_type = ?entry.payload.tx_type,
                        amount = entry.payload.amount,
                        error = %err,
                        "dropping rejected entry"
                    );
                    db::queue::remove(&self.queue, &entry.local_id).await?;
                    note_month(&mut touched_months, entry);
                }
            }
        }

        let remaining = db::queue::count(&self.queue, Some(&session.user_id)).await? as usize;

        // Anything removed means the cached read views are stale.
        if !touched_months.is_empty() {
            let mut projection = self.projection.lock().await;
            for month_key in &touched_months {
                projection.invalidate(month_key);
                if let Err(err) = projection
                    .refresh(session, self.read_api.as_ref(), month_key)
                    .await
                {
                    warn!(month = %month_key, error = %err, "failed to refresh views after drain");
                }
            }
        }

        info!(user_id = %session.user_id, synced, remaining, "drain finished");
        Ok(DrainReport { synced, remaining })
    }
}

fn note_month(months: &mut Vec<String>, entry: &QueuedTransaction) {
    let date = entry.payload.date.unwrap_or(entry.created_at);
    let key = month::month_of(&date);
    if !months.contains(&key) {
        months.push(key);
    }
}

/// Removes the user from the in-flight set when the drain ends, however
/// it ends.
struct DrainGuard<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    user_id: String,
}

impl<'a> DrainGuard<'a> {
    fn acquire(in_flight: &'a Mutex<HashSet<String>>, user_id: &str) -> Option<Self> {
        let mut set = in_flight.lock().expect("in-flight set poisoned");
        if !set.insert(user_id.to_string()) {
            return None;
        }
        Some(Self {
            in_flight,
            user_id: user_id.to_string(),
        })
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .expect("in-flight set poisoned")
            .remove(&self.user_id);
    }
}
