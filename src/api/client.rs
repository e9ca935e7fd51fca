//! HTTP client for the budget API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client as HttpClient;
use tracing::warn;

use super::models::{ErrorBody, SummaryResponse, TransactionsResponse};
use super::{CommitApi, ReadApi, SessionContext};
use crate::error::CommitError;
use crate::models::summary::Summary;
use crate::models::transaction::{CommitOutcome, Scope, TransactionPayload, TransactionRecord};

const IDEMPOTENCY_HEADER: &str = "X-Idempotency-Key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Budget API client. Replayed submissions carry their idempotency key in
/// the `X-Idempotency-Key` header.
pub struct BudgetApiClient {
    http_client: HttpClient,
    base_url: String,
}

impl BudgetApiClient {
    /// Create a new client for the given base URL.
    pub fn new(base_url: String) -> Result<Self, CommitError> {
        let http_client = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CommitError::Network(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Create default headers with bearer auth and, for replays, the
    /// idempotency key.
    fn create_headers(
        &self,
        session: &SessionContext,
        idempotency_key: Option<&str>,
    ) -> Result<HeaderMap, CommitError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", session.token))
            .map_err(|e| CommitError::Authorization(format!("invalid session token: {e}")))?;
        headers.insert(AUTHORIZATION, auth_value);

        if let Some(key) = idempotency_key {
            let key_value = HeaderValue::from_str(key)
                .map_err(|e| CommitError::validation("idempotencyKey", e.to_string()))?;
            headers.insert(IDEMPOTENCY_HEADER, key_value);
        }

        Ok(headers)
    }

    /// Map a failed response onto the error taxonomy. 4xx is terminal,
    /// 5xx transient.
    async fn handle_error_response(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> CommitError {
        let status_code = status.as_u16();
        let body_text = response.text().await.unwrap_or_default();

        match status_code {
            401 | 403 => CommitError::Authorization(error_message(&body_text)),
            400..=499 => {
                let (field, message) = match serde_json::from_str::<ErrorBody>(&body_text) {
                    Ok(body) => (validation_field(&body), body.error),
                    Err(_) => ("payload".to_string(), body_text),
                };
                CommitError::Validation { field, message }
            }
            _ => {
                warn!("Server error {}: {}", status_code, body_text);
                CommitError::Server(format!("{status_code}: {}", error_message(&body_text)))
            }
        }
    }

    /// A send-level failure means the request got no response at all; it
    /// is never proof the server did not commit.
    fn classify_send_error(err: reqwest::Error) -> CommitError {
        if err.is_timeout() {
            CommitError::Network(format!("request timed out: {err}"))
        } else {
            CommitError::Network(format!("request failed: {err}"))
        }
    }
}

fn error_message(body_text: &str) -> String {
    serde_json::from_str::<ErrorBody>(body_text)
        .map(|body| body.error)
        .unwrap_or_else(|_| body_text.to_string())
}

/// First offending field named in the error details, if the server sent
/// field-level detail.
fn validation_field(body: &ErrorBody) -> String {
    body.details
        .as_ref()
        .and_then(|details| details.get("fieldErrors"))
        .and_then(|fields| fields.as_object())
        .and_then(|fields| fields.keys().next().cloned())
        .unwrap_or_else(|| "payload".to_string())
}

#[async_trait]
impl CommitApi for BudgetApiClient {
    async fn submit(
        &self,
        session: &SessionContext,
        payload: &TransactionPayload,
        idempotency_key: Option<&str>,
    ) -> Result<CommitOutcome, CommitError> {
        let url = format!("{}/transactions", self.base_url);
        let headers = self.create_headers(session, idempotency_key)?;

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .json(payload)
            .send()
            .await
            .map_err(Self::classify_send_error)?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Self::handle_error_response(status, response).await);
        }

        response
            .json::<CommitOutcome>()
            .await
            .map_err(|e| CommitError::Server(format!("failed to parse commit response: {e}")))
    }
}

#[async_trait]
impl ReadApi for BudgetApiClient {
    async fn fetch_transactions(
        &self,
        session: &SessionContext,
        month: &str,
        scope: Scope,
    ) -> Result<Vec<TransactionRecord>, CommitError> {
        let url = format!("{}/transactions", self.base_url);
        let headers = self.create_headers(session, None)?;

        let response = self
            .http_client
            .get(&url)
            .headers(headers)
            .query(&[("month", month), ("scope", scope.as_str())])
            .send()
            .await
            .map_err(Self::classify_send_error)?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Self::handle_error_response(status, response).await);
        }

        let body = response
            .json::<TransactionsResponse>()
            .await
            .map_err(|e| CommitError::Server(format!("failed to parse transactions: {e}")))?;

        Ok(body.items)
    }

    async fn fetch_summary(
        &self,
        session: &SessionContext,
        month: &str,
        scope: Scope,
    ) -> Result<Summary, CommitError> {
        let url = format!("{}/summary", self.base_url);
        let headers = self.create_headers(session, None)?;

        let response = self
            .http_client
            .get(&url)
            .headers(headers)
            .query(&[("month", month), ("scope", scope.as_str())])
            .send()
            .await
            .map_err(Self::classify_send_error)?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Self::handle_error_response(status, response).await);
        }

        let body = response
            .json::<SummaryResponse>()
            .await
            .map_err(|e| CommitError::Server(format!("failed to parse summary: {e}")))?;

        Ok(body.summary)
    }
}
