//! Transaction models shared by the queue, the commit endpoint and the
//! read views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Budget bucket a transaction lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Fixed,
    Variable,
    Extra,
    Saving,
}

/// Aggregation boundary for read views: the requesting user alone, or the
/// whole household.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Personal,
    Family,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Personal => "personal",
            Scope::Family => "family",
        }
    }
}

/// Body of a submission before the server has assigned identity to it.
/// A missing date means "now" at commit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

/// A committed transaction in the authoritative store. Immutable after
/// creation except for owner-initiated deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub tx_type: TransactionType,
    pub amount: f64,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Result of the idempotent commit operation. `duplicated` marks a replay
/// that returned a previously committed transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitOutcome {
    pub transaction: TransactionRecord,
    pub duplicated: bool,
}

/// A row in a rendered transaction list view. Committed rows come from the
/// server; pending rows are synthesized by the optimistic projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionItem {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub amount: f64,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub pending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_id: Option<String>,
}

impl From<TransactionRecord> for TransactionItem {
    fn from(record: TransactionRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            tx_type: record.tx_type,
            amount: record.amount,
            description: record.description,
            date: record.date,
            created_at: record.created_at,
            pending: false,
            local_id: None,
        }
    }
}
