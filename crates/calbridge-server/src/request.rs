//! Wire request and response shapes.
//!
//! A [`MutationRequest`] mirrors the HTTP triple the adapter was written
//! against: a method, a body (POST/PUT), and a query string (DELETE). The
//! dispatcher never sees the framing; [`MutationRequest::parameters`]
//! normalizes both parameter sources into one JSON object.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use calbridge_providers::{SyncError, SyncResult};

/// One inbound mutation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationRequest {
    /// HTTP method: POST (create), PUT (update), DELETE (delete).
    pub method: String,
    /// Request body, JSON text. Used by POST and PUT.
    pub body: String,
    /// Query string, urlencoded. Used by DELETE.
    pub query: String,
}

impl MutationRequest {
    /// Builds a POST/PUT request carrying a JSON body.
    pub fn with_body(method: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            body: body.into(),
            query: String::new(),
        }
    }

    /// Builds a DELETE request carrying a query string.
    pub fn with_query(method: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            body: String::new(),
            query: query.into(),
        }
    }

    /// Normalizes the request's parameter source into a JSON object.
    ///
    /// POST/PUT parameters come from the body as JSON; DELETE parameters
    /// come from the query string. An empty source is the fixed
    /// "required parameter not exist." failure.
    pub fn parameters(&self) -> SyncResult<Map<String, Value>> {
        let raw = if self.method == "POST" || self.method == "PUT" {
            &self.body
        } else {
            &self.query
        };
        if raw.is_empty() {
            return Err(SyncError::missing_parameter_source());
        }

        if self.method == "POST" || self.method == "PUT" {
            match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(_) | Err(_) => Err(SyncError::missing_parameter_source()),
            }
        } else {
            let mut map = Map::new();
            for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
                map.insert(key.into_owned(), Value::String(value.into_owned()));
            }
            Ok(map)
        }
    }
}

/// One outbound response, in the `{status, headers, body}` shape the
/// transports (and tests) consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body as text.
    pub body: String,
}

impl ApiResponse {
    fn json_headers() -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers
    }

    /// A JSON response with the given status and serializable payload.
    pub fn json<T: Serialize>(status: u16, payload: &T) -> Self {
        let body = serde_json::to_string(payload).unwrap_or_else(|_| "{}".to_string());
        Self {
            status,
            headers: Self::json_headers(),
            body,
        }
    }

    /// The fixed 204 delete acknowledgement.
    pub fn no_content() -> Self {
        Self {
            status: 204,
            headers: Self::json_headers(),
            body: "[]".to_string(),
        }
    }

    /// Renders an error as `{"error": <message>}` at its mapped status.
    pub fn from_error(error: &SyncError) -> Self {
        Self::json(
            error.http_status(),
            &serde_json::json!({ "error": error.message() }),
        )
    }
}
