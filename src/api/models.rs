//! Wire DTOs for the budget API.

use serde::{Deserialize, Serialize};

use crate::models::summary::Summary;
use crate::models::transaction::{Scope, TransactionRecord};

/// GET /transactions response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionsResponse {
    pub month: String,
    pub scope: Scope,
    pub items: Vec<TransactionRecord>,
}

/// GET /summary response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub month: String,
    pub scope: Scope,
    pub currency: String,
    #[serde(flatten)]
    pub summary: Summary,
}

/// Error body returned by the server on failures.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}
