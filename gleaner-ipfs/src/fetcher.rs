//! Deadline-bounded HTTP retrieval.
//!
//! Every gateway attempt runs inside [`with_deadline`]. When the deadline
//! fires first the request future is dropped, which aborts the in-flight
//! request; nothing it would have produced is ever observed, so a late
//! response cannot touch shared state.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use gleaner_core::error::{GleanerError, Result};

/// Runs `fut` with a hard wall-clock deadline.
///
/// Returns [`GleanerError::Timeout`] if the deadline elapses first.
pub async fn with_deadline<T, F>(timeout: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(GleanerError::Timeout {
            millis: timeout.as_millis() as u64,
        }),
    }
}

/// HTTP fetcher whose every request is bounded by a deadline.
#[derive(Clone)]
pub struct DeadlineFetcher {
    http_client: reqwest::Client,
}

impl DeadlineFetcher {
    /// Creates a fetcher with a fresh HTTP client.
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| GleanerError::ConfigError(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self::with_client(http_client))
    }

    /// Creates a fetcher around an existing client.
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    /// Issues a GET and waits for the response head, at most `timeout`.
    ///
    /// The status is not inspected; connection-level failures become
    /// [`GleanerError::Network`].
    pub async fn fetch_with_deadline(&self, url: &str, timeout: Duration) -> Result<reqwest::Response> {
        with_deadline(timeout, async {
            self.http_client
                .get(url)
                .send()
                .await
                .map_err(|e| GleanerError::Network(e.to_string()))
        })
        .await
    }

    /// Fetches and parses a JSON document, with the whole exchange (head,
    /// body, parse) bounded by `timeout`.
    ///
    /// Non-success statuses become [`GleanerError::Transport`], bodies that
    /// are not JSON become [`GleanerError::Parse`].
    pub async fn fetch_json(&self, url: &str, timeout: Duration) -> Result<Value> {
        with_deadline(timeout, async {
            let response = self.fetch_with_deadline(url, timeout).await?;

            let status = response.status();
            if !status.is_success() {
                return Err(GleanerError::Transport {
                    status: status.as_u16(),
                });
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| GleanerError::Network(e.to_string()))?;

            let document = serde_json::from_slice(&body)?;
            debug!(url, bytes = body.len(), "Fetched JSON document");
            Ok(document)
        })
        .await
    }
}
