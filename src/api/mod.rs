//! Transport seam between the client-side sync machinery and the server.
//!
//! The sync engine and the interactive submit path only ever talk to the
//! `CommitApi` and `ReadApi` traits; the real HTTP client and the
//! in-process server implement them.

use async_trait::async_trait;

use crate::error::CommitError;
use crate::models::summary::Summary;
use crate::models::transaction::{CommitOutcome, Scope, TransactionPayload, TransactionRecord};

pub mod client;
pub mod local;
pub mod models;

/// Per-login session state, created at login and invalidated at logout.
/// Passed explicitly into every call; there is no ambient global.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user_id: String,
    pub token: String,
}

impl SessionContext {
    pub fn new(user_id: &str, token: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            token: token.to_string(),
        }
    }
}

/// The idempotent commit operation.
#[async_trait]
pub trait CommitApi: Send + Sync {
    /// Submit a transaction, optionally under an idempotency key. A
    /// replayed key yields the previously committed transaction with
    /// `duplicated = true`.
    async fn submit(
        &self,
        session: &SessionContext,
        payload: &TransactionPayload,
        idempotency_key: Option<&str>,
    ) -> Result<CommitOutcome, CommitError>;
}

/// Read views consumed for reconciliation after a drain.
#[async_trait]
pub trait ReadApi: Send + Sync {
    async fn fetch_transactions(
        &self,
        session: &SessionContext,
        month: &str,
        scope: Scope,
    ) -> Result<Vec<TransactionRecord>, CommitError>;

    async fn fetch_summary(
        &self,
        session: &SessionContext,
        month: &str,
        scope: Scope,
    ) -> Result<Summary, CommitError>;
}
