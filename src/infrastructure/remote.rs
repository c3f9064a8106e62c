//! Remote quote source.
//!
//! The sync client only needs one read: the current list of remote records.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{AppError, RemoteRecord, Result, SyncConfig};

/// Something that can hand back the current remote records.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch the leading `limit` records the remote currently serves.
    ///
    /// Records past the prefix are never inspected.
    ///
    /// # Errors
    /// `AppError::Network` when the remote is unreachable or answers with a
    /// non-success status, `AppError::RemoteParse` when the body is not an
    /// array or a record in the prefix has no string `title`.
    async fn fetch(&self, limit: usize) -> Result<Vec<RemoteRecord>>;
}

/// HTTP implementation reading a fixed JSON endpoint.
pub struct HttpRemote {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRemote {
    /// Build a client for the configured endpoint.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be constructed.
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("quote-sync/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(AppError::network)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl RemoteSource for HttpRemote {
    async fn fetch(&self, limit: usize) -> Result<Vec<RemoteRecord>> {
        tracing::debug!(endpoint = %self.endpoint, limit, "Fetching remote quotes");

        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(AppError::network)?
            .error_for_status()
            .map_err(AppError::network)?;

        let body = response.text().await.map_err(AppError::network)?;

        parse_records(&body, limit)
    }
}

/// Decode the leading `limit` records of a remote payload.
///
/// Only the prefix is decoded as records; anything after it may have any shape.
///
/// # Errors
/// Returns `AppError::RemoteParse` if the body is not a JSON array or a record
/// in the prefix lacks a string `title`.
pub fn parse_records(body: &str, limit: usize) -> Result<Vec<RemoteRecord>> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(AppError::remote_parse)?;

    let serde_json::Value::Array(items) = value else {
        return Err(AppError::RemoteParse {
            message: "expected a JSON array of records".to_string(),
            source: None,
        });
    };

    items
        .into_iter()
        .take(limit)
        .map(|item| serde_json::from_value(item).map_err(AppError::remote_parse))
        .collect()
}
