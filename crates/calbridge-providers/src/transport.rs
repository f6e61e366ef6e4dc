//! HTTP transport seam.
//!
//! All remote provider calls go through the [`HttpTransport`] trait so the
//! retry-with-refresh algorithm can be exercised against scripted responses.
//! The contract mirrors the external transport collaborator: a call yields a
//! normalized `{status, headers, body}` tuple, or `None` when the transport
//! itself failed (connect error, timeout). Providers treat `None` the same
//! way they treat a 401, as a refresh trigger where one applies.

use std::collections::HashMap;
use std::time::Duration;

use tracing::warn;

use crate::provider::BoxFuture;

/// The HTTP verb for a remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVerb {
    /// GET
    Get,
    /// POST (create)
    Post,
    /// PUT (Google update, token endpoint)
    Put,
    /// PATCH (Office365 update)
    Patch,
    /// DELETE
    Delete,
}

/// A normalized remote response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body as text.
    pub body: String,
}

impl WireResponse {
    /// Creates a response with the given status and body, no headers.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }
}

/// Transport used for all remote provider and token-endpoint calls.
///
/// A body, when present, is sent as `application/json`.
pub trait HttpTransport: Send + Sync {
    /// Issues one HTTP call. `None` means the transport failed outright.
    fn execute<'a>(
        &'a self,
        verb: HttpVerb,
        url: &'a str,
        headers: &'a [(String, String)],
        body: Option<&'a str>,
    ) -> BoxFuture<'a, Option<WireResponse>>;
}

/// `reqwest`-backed transport.
#[derive(Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with the given per-request timeout.
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to create HTTP client");
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute<'a>(
        &'a self,
        verb: HttpVerb,
        url: &'a str,
        headers: &'a [(String, String)],
        body: Option<&'a str>,
    ) -> BoxFuture<'a, Option<WireResponse>> {
        Box::pin(async move {
            let method = match verb {
                HttpVerb::Get => reqwest::Method::GET,
                HttpVerb::Post => reqwest::Method::POST,
                HttpVerb::Put => reqwest::Method::PUT,
                HttpVerb::Patch => reqwest::Method::PATCH,
                HttpVerb::Delete => reqwest::Method::DELETE,
            };

            let mut request = self.client.request(method, url);
            for (name, value) in headers {
                request = request.header(name.as_str(), value.as_str());
            }
            if let Some(body) = body {
                request = request
                    .header("Content-Type", "application/json")
                    .body(body.to_string());
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(url = %url, error = %e, "transport call failed");
                    return None;
                }
            };

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.to_string(), v.to_string()))
                })
                .collect();

            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(url = %url, error = %e, "failed to read response body");
                    return None;
                }
            };

            Some(WireResponse {
                status,
                headers,
                body,
            })
        })
    }
}
