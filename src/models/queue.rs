//! Queued transaction model for the local durable queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transaction::TransactionPayload;

/// A submission waiting in the local durable queue for replay against the
/// commit endpoint. The persisted layout must stay stable across client
/// versions; any change here requires a migration of queued entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedTransaction {
    pub local_id: String,
    pub user_id: String,
    pub idempotency_key: String,
    pub payload: TransactionPayload,
    pub created_at: DateTime<Utc>,
}

impl QueuedTransaction {
    /// Stage a payload for later replay, minting a fresh local id and
    /// idempotency key. `created_at` is stamped once, here, and never
    /// mutated afterwards.
    pub fn new(user_id: &str, payload: TransactionPayload) -> Self {
        Self::with_key(user_id, payload, Uuid::new_v4().to_string())
    }

    /// Stage a payload under a caller-supplied idempotency key.
    pub fn with_key(user_id: &str, payload: TransactionPayload, idempotency_key: String) -> Self {
        Self {
            local_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            idempotency_key,
            payload,
            created_at: Utc::now(),
        }
    }
}
