//! PostgREST-compatible remote store client.
//!
//! Documents go to `{base_url}/rest/v1/{collection}`; the schema (the
//! "database") is selected with `Content-Profile` / `Accept-Profile`.
//! Inserts use `on_conflict=event_id` with `resolution=ignore-duplicates`,
//! so documents already present are a no-op. PostgREST inserts a JSON array
//! in one statement, so a single bad document rejects the whole request;
//! the batch is then retried one document per request and reported as a
//! partial outcome for reconciliation.

use crate::remote::{BulkInsertOutcome, RemoteDocument, RemoteStore};
use crate::{OutboxError, OutboxResult};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Connection settings for [`RestRemoteStore`].
#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    /// Base URL, e.g. `https://xyz.supabase.co`.
    pub base_url: String,
    /// Schema holding the collection.
    pub schema: String,
    /// Table name.
    pub collection: String,
    /// Optional API key, sent as `apikey` and as bearer token.
    pub api_key: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for RestStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            schema: "log_monitoring".to_string(),
            collection: "logs".to_string(),
            api_key: None,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Result of one POST that reached the server.
enum PostOutcome {
    Stored,
    /// The server refused the request body.
    Rejected(String),
}

#[derive(Debug, Deserialize)]
struct EventIdRow {
    event_id: String,
}

/// Remote log store reached over a PostgREST endpoint.
#[derive(Clone)]
pub struct RestRemoteStore {
    http_client: reqwest::Client,
    config: RestStoreConfig,
}

impl RestRemoteStore {
    /// Build a client. Fails only if the HTTP client cannot be constructed.
    pub fn new(config: RestStoreConfig) -> OutboxResult<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| OutboxError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// REST URL of the collection.
    fn collection_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.collection
        )
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request
                .header("apikey", key)
                .header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }

    /// POST `docs` as one statement.
    async fn post_documents(&self, docs: &[RemoteDocument]) -> OutboxResult<PostOutcome> {
        let response = self
            .with_auth(self.http_client.post(self.collection_url()))
            .query(&[("on_conflict", "event_id")])
            .header("Content-Profile", &self.config.schema)
            .header("Prefer", "resolution=ignore-duplicates,return=minimal")
            .json(docs)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(PostOutcome::Stored);
        }
        if is_rejection(status) {
            let body = response.text().await.unwrap_or_default();
            return Ok(PostOutcome::Rejected(body));
        }
        Err(Self::status_error(response).await)
    }

    async fn status_error(response: reqwest::Response) -> OutboxError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if matches!(
            status,
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
        ) {
            return OutboxError::Connectivity(format!("HTTP {}: {}", status, body));
        }
        OutboxError::RemoteStatus {
            status: status.as_u16(),
            message: body,
        }
    }
}

#[async_trait]
impl RemoteStore for RestRemoteStore {
    async fn insert_unordered(&self, docs: &[RemoteDocument]) -> OutboxResult<BulkInsertOutcome> {
        if docs.is_empty() {
            return Ok(BulkInsertOutcome::Complete);
        }

        debug!(url = %self.collection_url(), count = docs.len(), "Inserting documents");

        let detail = match self.post_documents(docs).await? {
            PostOutcome::Stored => return Ok(BulkInsertOutcome::Complete),
            PostOutcome::Rejected(detail) => detail,
        };

        if docs.len() == 1 {
            warn!(event_id = %docs[0].event_id, body = %detail, "Remote insert rejected");
            return Ok(BulkInsertOutcome::Partial { detail });
        }

        warn!(
            count = docs.len(),
            body = %detail,
            "Bulk insert rejected, inserting documents one by one"
        );

        let mut rejected = Vec::new();
        for doc in docs {
            match self.post_documents(std::slice::from_ref(doc)).await? {
                PostOutcome::Stored => {}
                PostOutcome::Rejected(body) => {
                    warn!(event_id = %doc.event_id, body = %body, "Remote insert rejected");
                    rejected.push(doc.event_id.as_str());
                }
            }
        }

        if rejected.is_empty() {
            return Ok(BulkInsertOutcome::Complete);
        }
        Ok(BulkInsertOutcome::Partial {
            detail: format!(
                "{} of {} documents rejected ({}): {}",
                rejected.len(),
                docs.len(),
                rejected.join(", "),
                detail
            ),
        })
    }

    async fn existing_event_ids(&self, event_ids: &[String]) -> OutboxResult<HashSet<String>> {
        if event_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let response = self
            .with_auth(self.http_client.get(self.collection_url()))
            .header("Accept-Profile", &self.config.schema)
            .query(&[
                ("select", "event_id".to_string()),
                ("event_id", in_filter(event_ids)),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let body = response.text().await?;
        let rows: Vec<EventIdRow> = serde_json::from_str(&body)?;
        Ok(rows.into_iter().map(|row| row.event_id).collect())
    }
}

impl std::fmt::Debug for RestRemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestRemoteStore")
            .field("base_url", &self.config.base_url)
            .field("schema", &self.config.schema)
            .field("collection", &self.config.collection)
            .finish_non_exhaustive()
    }
}

/// Statuses meaning the server understood the request but refused its
/// content. Retrying the same body will not help.
fn is_rejection(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST
            | StatusCode::CONFLICT
            | StatusCode::PAYLOAD_TOO_LARGE
            | StatusCode::UNPROCESSABLE_ENTITY
    )
}

/// Build a PostgREST `in.(...)` filter with every value double-quoted.
fn in_filter(values: &[String]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("in.({})", quoted.join(","))
}

/// DDL for the remote collection, including the `event_id` unique index
/// that makes redelivery idempotent.
pub fn remote_table_ddl(schema: &str, collection: &str) -> String {
    format!(
        "CREATE SCHEMA IF NOT EXISTS {schema};
CREATE TABLE IF NOT EXISTS {schema}.{collection} (
    id BIGSERIAL PRIMARY KEY,
    event_id TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    message TEXT NOT NULL,
    severity TEXT NOT NULL,
    captured_at TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS {collection}_event_id_key ON {schema}.{collection} (event_id);
"
    )
}
