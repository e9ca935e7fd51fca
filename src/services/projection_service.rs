//! Optimistic projection: cached read views with queued-but-unconfirmed
//! entries overlaid, until the authoritative store replaces them.
//!
//! Two explicit operations, both invoked by their callers rather than any
//! reactive cache layer: `merge_pending` overlays a provisional entry, and
//! `invalidate` + `refresh` replace a month's views wholesale. Views are
//! never patched field by field; a provisional value that disagreed with
//! the server would otherwise drift forever.

use std::collections::HashMap;

use chrono::Utc;

use crate::api::{ReadApi, SessionContext};
use crate::error::CommitError;
use crate::models::summary::Summary;
use crate::models::transaction::{Scope, TransactionItem, TransactionPayload};
use crate::utils::month;

/// Cache key for one read view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewKey {
    pub month: String,
    pub scope: Scope,
}

impl ViewKey {
    fn new(month: &str, scope: Scope) -> Self {
        Self {
            month: month.to_string(),
            scope,
        }
    }
}

/// Client-side cache of transaction lists and summaries per (month, scope).
#[derive(Debug, Default)]
pub struct ProjectionCache {
    transactions: HashMap<ViewKey, Vec<TransactionItem>>,
    summaries: HashMap<ViewKey, Summary>,
}

impl ProjectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transactions(&self, month: &str, scope: Scope) -> Option<&[TransactionItem]> {
        self.transactions
            .get(&ViewKey::new(month, scope))
            .map(Vec::as_slice)
    }

    pub fn summary(&self, month: &str, scope: Scope) -> Option<&Summary> {
        self.summaries.get(&ViewKey::new(month, scope))
    }

    /// Seed a fetched transaction list into the cache.
    pub fn put_transactions(&mut self, month: &str, scope: Scope, items: Vec<TransactionItem>) {
        self.transactions.insert(ViewKey::new(month, scope), items);
    }

    /// Seed a fetched summary into the cache.
    pub fn put_summary(&mut self, month: &str, scope: Scope, summary: Summary) {
        self.summaries.insert(ViewKey::new(month, scope), summary);
    }

    /// Overlay-merge: render a queued entry into every cached view that
    /// could display it, for both scopes of the payload's month. The
    /// summary delta uses the same aggregation rule the server applies, so
    /// the displayed numbers match what the server will eventually report.
    /// A cold summary stays cold; income and goal are unknown client-side.
    pub fn merge_pending(&mut self, user_id: &str, payload: &TransactionPayload, local_id: &str) {
        let date = payload.date.unwrap_or_else(Utc::now);
        let now = Utc::now();
        let month_key = month::month_of(&date);

        let item = TransactionItem {
            id: format!("pending-{local_id}"),
            user_id: user_id.to_string(),
            tx_type: payload.tx_type,
            amount: payload.amount,
            description: payload.description.clone(),
            date,
            created_at: now,
            pending: true,
            local_id: Some(local_id.to_string()),
        };

        for scope in [Scope::Personal, Scope::Family] {
            let key = ViewKey::new(&month_key, scope);

            let view = self.transactions.entry(key.clone()).or_default();
            view.retain(|row| row.id != item.id);
            view.insert(0, item.clone());

            if let Some(summary) = self.summaries.get_mut(&key) {
                summary.apply(payload.tx_type, payload.amount);
            }
        }
    }

    /// Drop all cached views for a month, provisional entries included,
    /// so the next read refetches from the server.
    pub fn invalidate(&mut self, month: &str) {
        self.transactions.retain(|key, _| key.month != month);
        self.summaries.retain(|key, _| key.month != month);
    }

    /// Authoritative refresh: replace both scopes of a month wholesale
    /// with fresh reads from the server.
    pub async fn refresh(
        &mut self,
        session: &SessionContext,
        read_api: &dyn ReadApi,
        month: &str,
    ) -> Result<(), CommitError> {
        for scope in [Scope::Personal, Scope::Family] {
            let items = read_api.fetch_transactions(session, month, scope).await?;
            let summary = read_api.fetch_summary(session, month, scope).await?;

            self.put_transactions(month, scope, items.into_iter().map(TransactionItem::from).collect());
            self.put_summary(month, scope, summary);
        }

        Ok(())
    }
}
