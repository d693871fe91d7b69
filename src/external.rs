//! External Broadcast Services
//!
//! Fallback transaction submission through independent HTTP broadcast
//! vendors when no full node is usable. Two vendor shapes are supported:
//! a JSON API authenticated with an `x-api-key` header that returns the txid
//! in a JSON body, and esplora-style endpoints that take raw hex as a
//! plain-text POST body.
//!
//! Each endpoint gets a bounded number of attempts with exponential backoff
//! on rate-limit responses only; any other failure moves straight to the
//! next endpoint. The last error is threaded through the loop and surfaced
//! when every endpoint is exhausted.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Network;

/// JSON broadcast vendor endpoint
pub const JSON_VENDOR_URL: &str = "https://api.tatum.io/v3/bitcoin/broadcast";

/// Retry tuning for external submission
#[derive(Debug, Clone)]
pub struct ExternalConfig {
    /// Attempts per endpoint (rate-limit retries)
    pub max_attempts: u32,
    /// Base backoff delay, doubled on each rate-limited attempt
    pub backoff_base: Duration,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for ExternalConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            request_timeout: Duration::from_secs(20),
        }
    }
}

/// External broadcast errors
#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("{service} rate limited after {attempts} attempts")]
    RateLimited { service: String, attempts: u32 },

    #[error("{service} rejected the transaction: {detail}")]
    Rejected { service: String, detail: String },

    #[error("{service} request failed: {detail}")]
    Request { service: String, detail: String },

    #[error("all broadcast services failed; last error: {last}")]
    AllFailed { last: String },
}

impl ExternalError {
    /// Whether this failure looks like "the parent transaction is not yet
    /// visible to the service" - transient once the commit propagates.
    /// These vendors return bare text with no error code, so substring
    /// matching is the only signal available.
    pub fn is_parent_missing(&self) -> bool {
        let detail = match self {
            ExternalError::Rejected { detail, .. } => detail,
            ExternalError::AllFailed { last } => last,
            _ => return false,
        };
        let detail = detail.to_lowercase();
        detail.contains("missingorspent")
            || detail.contains("missing-inputs")
            || detail.contains("missing inputs")
            || detail.contains("orphan")
    }
}

/// A single broadcast endpoint
#[derive(Debug, Clone)]
pub enum Endpoint {
    /// JSON envelope with API-key header; txid under `txId` in the response
    Json { name: String, url: String, api_key: String },
    /// Raw hex POST against an esplora-style `{base}/tx` route
    PlainText { name: String, base_url: String },
}

impl Endpoint {
    fn name(&self) -> &str {
        match self {
            Endpoint::Json { name, .. } => name,
            Endpoint::PlainText { name, .. } => name,
        }
    }
}

/// Priority-ordered external broadcast client
#[derive(Debug, Clone)]
pub struct ExternalBroadcaster {
    http: Client,
    endpoints: Vec<Endpoint>,
    config: ExternalConfig,
}

impl ExternalBroadcaster {
    /// Build the endpoint list for a network: the JSON vendor first when an
    /// API key is configured, then each explorer endpoint variant.
    pub fn new(network: Network, api_key: Option<String>) -> Self {
        let mut endpoints = Vec::new();

        if let Some(key) = api_key {
            endpoints.push(Endpoint::Json {
                name: "tatum".to_string(),
                url: JSON_VENDOR_URL.to_string(),
                api_key: key,
            });
        }

        for (i, base) in network.explorer_urls().into_iter().enumerate() {
            endpoints.push(Endpoint::PlainText {
                name: format!("esplora-{}", i + 1),
                base_url: base.to_string(),
            });
        }

        Self::with_endpoints(endpoints, ExternalConfig::default())
    }

    /// Build from explicit endpoints (tests, custom deployments)
    pub fn with_endpoints(endpoints: Vec<Endpoint>, config: ExternalConfig) -> Self {
        Self {
            http: Client::new(),
            endpoints,
            config,
        }
    }

    /// Broadcast a raw transaction through the first endpoint that accepts it.
    pub async fn broadcast_tx(&self, tx_hex: &str) -> Result<String, ExternalError> {
        // Explicit accumulator: the last failure travels through the loop
        let mut last_err: Option<ExternalError> = None;

        for endpoint in &self.endpoints {
            match self.try_endpoint(endpoint, tx_hex).await {
                Ok(txid) => {
                    info!(service = endpoint.name(), %txid, "external broadcast accepted");
                    return Ok(txid);
                }
                Err(e) => {
                    warn!(service = endpoint.name(), error = %e, "external broadcast attempt failed");
                    last_err = Some(e);
                }
            }
        }

        Err(ExternalError::AllFailed {
            last: last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no broadcast services configured".to_string()),
        })
    }

    /// One endpoint, up to `max_attempts` tries. Only rate-limit responses
    /// are retried here; anything else is the next endpoint's problem.
    async fn try_endpoint(&self, endpoint: &Endpoint, tx_hex: &str) -> Result<String, ExternalError> {
        let service = endpoint.name().to_string();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = match endpoint {
                Endpoint::Json { url, api_key, .. } => {
                    self.submit_json(&service, url, api_key, tx_hex).await
                }
                Endpoint::PlainText { base_url, .. } => {
                    self.submit_plain(&service, base_url, tx_hex).await
                }
            };

            match result {
                Ok(txid) => return Ok(txid),
                Err(SubmitError::RateLimited) => {
                    if attempt >= self.config.max_attempts {
                        return Err(ExternalError::RateLimited {
                            service,
                            attempts: attempt,
                        });
                    }
                    let delay = self.config.backoff_base * 2u32.pow(attempt - 1);
                    warn!(%service, attempt, delay_ms = delay.as_millis() as u64, "rate limited, backing off");
                    tokio::time::sleep(delay).await;
                }
                Err(SubmitError::Rejected(detail)) => {
                    return Err(ExternalError::Rejected { service, detail });
                }
                Err(SubmitError::Request(detail)) => {
                    return Err(ExternalError::Request { service, detail });
                }
            }
        }
    }

    async fn submit_json(
        &self,
        service: &str,
        url: &str,
        api_key: &str,
        tx_hex: &str,
    ) -> Result<String, SubmitError> {
        let resp = self
            .http
            .post(url)
            .timeout(self.config.request_timeout)
            .header("x-api-key", api_key)
            .json(&json!({ "txData": tx_hex }))
            .send()
            .await
            .map_err(|e| SubmitError::Request(e.to_string()))?;

        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(SubmitError::RateLimited);
        }

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SubmitError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(SubmitError::Rejected(body));
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|_| SubmitError::Rejected(format!("{}: non-JSON response", service)))?;

        value
            .pointer("/txId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SubmitError::Rejected(format!("{}: response missing txId", service)))
    }

    async fn submit_plain(
        &self,
        service: &str,
        base_url: &str,
        tx_hex: &str,
    ) -> Result<String, SubmitError> {
        let url = format!("{}/tx", base_url.trim_end_matches('/'));
        let resp = self
            .http
            .post(&url)
            .timeout(self.config.request_timeout)
            .body(tx_hex.to_string())
            .send()
            .await
            .map_err(|e| SubmitError::Request(e.to_string()))?;

        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(SubmitError::RateLimited);
        }

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SubmitError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(SubmitError::Rejected(body));
        }

        let body = body.trim();

        // Some deployments answer with a small JSON object instead of bare hex
        if body.starts_with('{') {
            let value: Value = serde_json::from_str(body)
                .map_err(|_| SubmitError::Rejected(format!("{}: unparseable response", service)))?;
            return value
                .get("txid")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| SubmitError::Rejected(format!("{}: response missing txid", service)));
        }

        Ok(body.to_string())
    }
}

/// Per-request failure classification, internal to the attempt loop
enum SubmitError {
    RateLimited,
    Rejected(String),
    Request(String),
}
