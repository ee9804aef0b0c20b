//! Upstream forwarding module
//!
//! Performs exactly one round trip to the configured upstream per request.
//! The whole exchange, body included, completes (or fails) before anything is
//! written to the client.

use crate::http::headers;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{HeaderMap, Method, Request, StatusCode, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;

/// Why an upstream round trip produced no response
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("invalid upstream target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    /// Connection refused, DNS failure, reset, malformed response...
    #[error("{0}")]
    Transport(String),

    #[error("upstream did not respond within {} seconds", .0.as_secs())]
    Timeout(Duration),

    #[error("failed to read upstream body: {0}")]
    Body(#[source] hyper::Error),
}

/// Response exactly as received from the upstream
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Forwards requests to a single fixed upstream
pub struct UpstreamForwarder {
    client: Client<HttpConnector, Full<Bytes>>,
    base_url: String,
    timeout: Duration,
}

impl UpstreamForwarder {
    /// `base_url` is `scheme://host:port` without a trailing slash
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        // Idle pool disabled: every request opens its own upstream connection
        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(HttpConnector::new());

        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Target URI for a request path (which includes the query)
    pub fn target_uri(&self, path_and_query: &str) -> Result<Uri, ProxyError> {
        let target = format!("{}{}", self.base_url, path_and_query);
        target
            .parse::<Uri>()
            .map_err(|e| ProxyError::InvalidTarget {
                reason: e.to_string(),
                target,
            })
    }

    /// Issue one upstream request and collect the full response
    ///
    /// `body` is sent unmodified; pass an empty body for read methods.
    pub async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        incoming_headers: &HeaderMap,
        body: Bytes,
    ) -> Result<UpstreamResponse, ProxyError> {
        let uri = self.target_uri(path_and_query)?;

        let mut request = Request::new(Full::new(body));
        *request.method_mut() = method;
        *request.uri_mut() = uri;
        *request.headers_mut() = headers::outgoing_request_headers(incoming_headers);

        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| ProxyError::Transport(describe(&e)))?;

            let (parts, body) = response.into_parts();
            let body = body.collect().await.map_err(ProxyError::Body)?.to_bytes();

            Ok(UpstreamResponse {
                status: parts.status,
                headers: parts.headers,
                body,
            })
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| ProxyError::Timeout(self.timeout))?
    }
}

/// Render an error together with its source chain
///
/// The client error's own message is terse ("client error (Connect)"); the
/// useful detail lives in its sources.
fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
