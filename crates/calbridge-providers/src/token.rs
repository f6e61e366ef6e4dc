//! Token-refresh coordination.
//!
//! When a bearer-token provider call comes back 401 (or not at all), the
//! executor asks the [`TokenRefresher`] for a new access token. The actual
//! OAuth exchange lives behind an external token endpoint; this module only
//! triggers it and interprets the result. A refresh failure is terminal:
//! the operation fails without further retries.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use calbridge_core::SourceType;

use crate::error::{SyncError, SyncResult};
use crate::transport::{HttpTransport, HttpVerb};

/// Successful token-endpoint response body.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Coordinates access-token refresh against the external token endpoint.
#[derive(Clone)]
pub struct TokenRefresher {
    endpoint: String,
    transport: Arc<dyn HttpTransport>,
}

impl TokenRefresher {
    /// Creates a refresher targeting the given token-exchange endpoint.
    pub fn new(endpoint: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
        }
    }

    /// Exchanges the refresh token for a new access token.
    ///
    /// The endpoint receives `{"refresh_token": ..., "srcType": ...}` and
    /// answers `{"access_token": ...}` on 200. An unreachable endpoint or a
    /// non-200 answer fails with the caller-visible auth wording.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        src_type: SourceType,
    ) -> SyncResult<String> {
        let body = serde_json::json!({
            "refresh_token": refresh_token,
            "srcType": src_type.as_str(),
        })
        .to_string();

        let response = self
            .transport
            .execute(HttpVerb::Put, &self.endpoint, &[], Some(&body))
            .await;

        let response = match response {
            Some(response) => response,
            None => {
                warn!(src_type = %src_type, "token endpoint unreachable");
                return Err(SyncError::auth_failed());
            }
        };

        if response.status != 200 {
            warn!(
                src_type = %src_type,
                status = response.status,
                "token refresh rejected"
            );
            return Err(SyncError::auth_failed());
        }

        let parsed: TokenResponse = serde_json::from_str(&response.body).map_err(|e| {
            SyncError::internal(format!("invalid token endpoint response: {e}"))
        })?;

        info!(src_type = %src_type, "refreshed access token");
        Ok(parsed.access_token)
    }
}
