// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Shipping of completed batches to the LogDNA ingestion endpoint.
//!
//! ```text
//!   batch ──> {"lines":[...]} ──> POST ?hostname=..&now=.. ──> 2xx ──> Delivered
//!                                        │
//!                                        ├─ transport error / 429 / 5xx ──> backoff, retry
//!                                        └─ other 4xx, retries exhausted ──> Dropped
//! ```
//!
//! Every response body is read to the end before the response is released,
//! whatever its status. A body that fails to read after a 2xx status still
//! counts as delivered: the intake has already accepted the batch.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::constants::{API_KEY_HEADER, CONTENT_TYPE as JSON_CONTENT_TYPE};
use crate::error::ForwardError;
use crate::http::get_client;
use crate::payload::{serialize_batch, FormattedLine};
use crate::util::unix_now;

/// Destination for completed batches.
#[async_trait]
pub trait BatchSink: Send + Sync {
    /// Delivers `batch`, retrying as the implementation sees fit.
    /// An `Err` means the batch was not delivered and will not be retried.
    async fn send(&self, batch: &[FormattedLine]) -> Result<(), ForwardError>;
}

/// HTTP sink for the LogDNA ingestion API.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    config: Arc<Config>,
    headers: HeaderMap,
}

impl Forwarder {
    pub fn new(config: Arc<Config>) -> Result<Self, ForwardError> {
        let client = get_client(&config).map_err(|e| ForwardError::Client(e.to_string()))?;
        let headers = build_headers(&config.api_key)?;
        Ok(Forwarder {
            client,
            config,
            headers,
        })
    }

    async fn send_once(&self, body: Bytes) -> Result<(), ForwardError> {
        let now = unix_now().to_string();
        let resp = self
            .client
            .post(&self.config.ingest_url)
            .query(&[
                ("hostname", self.config.hostname.as_str()),
                ("now", now.as_str()),
            ])
            .headers(self.headers.clone())
            .body(body)
            .send()
            .await
            .map_err(ForwardError::Transport)?;

        let status = resp.status();
        let body = match resp.bytes().await {
            Ok(body) => body,
            Err(e) => {
                debug!("LOGS | Failed to read {} response body: {}", status, e);
                Bytes::new()
            }
        };
        if status.is_success() {
            Ok(())
        } else {
            Err(ForwardError::Status {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            })
        }
    }
}

#[async_trait]
impl BatchSink for Forwarder {
    async fn send(&self, batch: &[FormattedLine]) -> Result<(), ForwardError> {
        if batch.is_empty() {
            return Ok(());
        }
        let body = Bytes::from(serialize_batch(batch).map_err(ForwardError::Serialization)?);
        let strategy = self.config.retry_strategy;
        let max_attempts = strategy.max_attempts();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let time = Instant::now();
            let result = self.send_once(body.clone()).await;
            let elapsed = time.elapsed();

            match result {
                Ok(()) => {
                    debug!(
                        "LOGS | Shipped {} lines in {} ms (attempt {})",
                        batch.len(),
                        elapsed.as_millis(),
                        attempts
                    );
                    return Ok(());
                }
                Err(e) if !e.is_retryable() => {
                    error!("LOGS | Batch rejected by ingestion endpoint: {}", e);
                    return Err(e);
                }
                Err(e) if attempts >= max_attempts => {
                    error!(
                        "LOGS | Failed to send batch after {} ms and {} attempts: {}",
                        elapsed.as_millis(),
                        attempts,
                        e
                    );
                    return Err(ForwardError::RetriesExhausted {
                        attempts,
                        source: Box::new(e),
                    });
                }
                Err(e) => {
                    let delay = strategy.delay_after(attempts);
                    warn!(
                        "LOGS | Attempt {} of {} failed: {}, retrying in {} ms",
                        attempts,
                        max_attempts,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

fn build_headers(api_key: &str) -> Result<HeaderMap, ForwardError> {
    let mut headers = HeaderMap::new();
    let mut key = HeaderValue::from_str(api_key)?;
    key.set_sensitive(true);
    headers.insert(API_KEY_HEADER, key);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    Ok(headers)
}
