//! In-process API over the authoritative store, for single-process
//! deployments and tests. Same contract as the HTTP client.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;

use super::{CommitApi, ReadApi, SessionContext};
use crate::error::CommitError;
use crate::models::summary::Summary;
use crate::models::transaction::{CommitOutcome, Scope, TransactionPayload, TransactionRecord};
use crate::services::{commit_service, summary_service};

pub struct LocalApi {
    pool: SqlitePool,
}

impl LocalApi {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommitApi for LocalApi {
    async fn submit(
        &self,
        session: &SessionContext,
        payload: &TransactionPayload,
        idempotency_key: Option<&str>,
    ) -> Result<CommitOutcome, CommitError> {
        commit_service::commit_transaction(&self.pool, &session.user_id, payload, idempotency_key)
            .await
    }
}

#[async_trait]
impl ReadApi for LocalApi {
    async fn fetch_transactions(
        &self,
        session: &SessionContext,
        month: &str,
        scope: Scope,
    ) -> Result<Vec<TransactionRecord>, CommitError> {
        summary_service::list_transactions(&self.pool, &session.user_id, month, scope).await
    }

    async fn fetch_summary(
        &self,
        session: &SessionContext,
        month: &str,
        scope: Scope,
    ) -> Result<Summary, CommitError> {
        summary_service::month_summary(&self.pool, &session.user_id, month, scope).await
    }
}
