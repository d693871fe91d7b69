//! JSON-RPC Client for the Bitcoin Full Node
//!
//! Speaks JSON-RPC 2.0 over HTTP POST with optional Basic-Auth. One HTTP
//! round trip per call; the numeric request id correlates exactly one
//! in-flight call to its response. The client never retries internally -
//! retry policy belongs to callers, which need different backoff semantics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::RpcConfig;

/// Default per-call timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// RPC client errors
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("cannot reach node at {url}: {detail}")]
    Connection { url: String, detail: String },

    #[error("RPC call '{method}' timed out after {seconds}s")]
    Timeout { method: String, seconds: u64 },

    #[error("unexpected RPC response: {0}")]
    Protocol(String),

    #[error("node error {code}: {message}")]
    Node { code: i64, message: String },
}

impl RpcError {
    /// The node error kind, if this is a node-reported error
    pub fn node_kind(&self) -> Option<NodeErrorKind> {
        match self {
            RpcError::Node { code, .. } => Some(NodeErrorKind::from_code(*code)),
            _ => None,
        }
    }

    /// Transport-level failure (connection refused, DNS, timeout)
    pub fn is_transport(&self) -> bool {
        matches!(self, RpcError::Connection { .. } | RpcError::Timeout { .. })
    }
}

/// Well-known Bitcoin Core error codes, as a closed lookup table.
///
/// Matching on the numeric code is deliberate: the node's message text for
/// the same condition varies across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeErrorKind {
    /// -28: node is starting up / loading its block index
    Warmup,
    /// -25: verification failure - missing or spent inputs, package
    /// topology rejections
    VerifyRejected,
    /// -26: transaction rejected by mempool policy
    MempoolRejected,
    /// -27: transaction already confirmed in a block
    AlreadyInChain,
    /// -22: raw transaction failed to deserialize
    Deserialization,
    /// -8: invalid parameter
    InvalidParameter,
    /// -32601: method not found (node too old for this call)
    MethodNotFound,
    /// anything else
    Other,
}

impl NodeErrorKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            -28 => NodeErrorKind::Warmup,
            -25 => NodeErrorKind::VerifyRejected,
            -26 => NodeErrorKind::MempoolRejected,
            -27 => NodeErrorKind::AlreadyInChain,
            -22 => NodeErrorKind::Deserialization,
            -8 => NodeErrorKind::InvalidParameter,
            -32601 => NodeErrorKind::MethodNotFound,
            _ => NodeErrorKind::Other,
        }
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a [Value],
}

/// JSON-RPC 2.0 client
#[derive(Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    config: Arc<RpcConfig>,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(config: Arc<RpcConfig>) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            next_id: AtomicU64::new(1),
        }
    }

    /// The configured endpoint URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Issue one JSON-RPC call and decode the `result` field.
    pub async fn call(
        &self,
        method: &str,
        params: Vec<Value>,
        timeout: Duration,
    ) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params: &params,
        };

        debug!(method, id, "rpc call");

        let mut builder = self
            .http
            .post(&self.config.url)
            .timeout(timeout)
            .json(&request);

        if let Some(ref user) = self.config.user {
            builder = builder.basic_auth(user, self.config.password.as_deref());
        }

        let response = builder.send().await.map_err(|e| self.map_transport(method, timeout, e))?;
        let status = response.status();

        // Bitcoin Core reports RPC-level errors with a 500 status and a
        // JSON-RPC error body, so decode the body before judging the status.
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport(method, timeout, e))?;

        let envelope: Value = serde_json::from_str(&body).map_err(|_| {
            if status.is_success() {
                RpcError::Protocol(format!("non-JSON body for '{}'", method))
            } else {
                RpcError::Protocol(format!(
                    "HTTP {} for '{}': {}",
                    status.as_u16(),
                    method,
                    truncate(&body, 200)
                ))
            }
        })?;

        if let Some(error) = envelope.get("error").filter(|e| !e.is_null()) {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("(no message)")
                .to_string();
            return Err(RpcError::Node { code, message });
        }

        if !status.is_success() {
            return Err(RpcError::Protocol(format!(
                "HTTP {} for '{}'",
                status.as_u16(),
                method
            )));
        }

        envelope
            .get("result")
            .cloned()
            .ok_or_else(|| RpcError::Protocol(format!("missing result for '{}'", method)))
    }

    fn map_transport(&self, method: &str, timeout: Duration, e: reqwest::Error) -> RpcError {
        if e.is_timeout() {
            RpcError::Timeout {
                method: method.to_string(),
                seconds: timeout.as_secs(),
            }
        } else {
            let detail = if e.is_connect() {
                format!("{} (is the node running and the RPC port open?)", e)
            } else {
                e.to_string()
            };
            RpcError::Connection {
                url: self.config.url.clone(),
                detail,
            }
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client_for(url: &str) -> RpcClient {
        RpcClient::new(Arc::new(RpcConfig::new(url)))
    }

    #[test]
    fn test_error_code_table() {
        assert_eq!(NodeErrorKind::from_code(-28), NodeErrorKind::Warmup);
        assert_eq!(NodeErrorKind::from_code(-25), NodeErrorKind::VerifyRejected);
        assert_eq!(NodeErrorKind::from_code(-26), NodeErrorKind::MempoolRejected);
        assert_eq!(NodeErrorKind::from_code(-27), NodeErrorKind::AlreadyInChain);
        assert_eq!(NodeErrorKind::from_code(-22), NodeErrorKind::Deserialization);
        assert_eq!(NodeErrorKind::from_code(-99), NodeErrorKind::Other);
    }

    #[tokio::test]
    async fn test_call_decodes_result() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(json!({
                "jsonrpc": "2.0",
                "method": "getblockcount"
            })))
            .with_body(r#"{"result": 850000, "error": null, "id": 1}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let result = client
            .call("getblockcount", vec![], DEFAULT_TIMEOUT)
            .await
            .unwrap();

        assert_eq!(result, json!(850000));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_call_decodes_node_error_from_http_500() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(500)
            .with_body(r#"{"result": null, "error": {"code": -28, "message": "Loading block index..."}, "id": 1}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client
            .call("getblockchaininfo", vec![], DEFAULT_TIMEOUT)
            .await
            .unwrap_err();

        match err {
            RpcError::Node { code, ref message } => {
                assert_eq!(code, -28);
                assert!(message.contains("Loading block index"));
            }
            other => panic!("expected node error, got {:?}", other),
        }
        assert_eq!(err.node_kind(), Some(NodeErrorKind::Warmup));
    }

    #[tokio::test]
    async fn test_call_maps_malformed_body_to_protocol_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(502)
            .with_body("<html>bad gateway</html>")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client
            .call("getblockchaininfo", vec![], DEFAULT_TIMEOUT)
            .await
            .unwrap_err();

        assert!(matches!(err, RpcError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport() {
        // Port 1 is essentially never listening
        let client = client_for("http://127.0.0.1:1");
        let err = client
            .call("getblockcount", vec![], Duration::from_secs(2))
            .await
            .unwrap_err();

        assert!(err.is_transport());
    }
}
