//! Office365 mutation protocol.

use std::sync::Arc;

use tracing::debug;

use calbridge_core::{EventDraft, EventParams, SourceType, VEvent};

use crate::access_info::{AccessInfoEntry, AccessInfoStore};
use crate::error::{SyncError, SyncResult};
use crate::provider::{BoxFuture, SyncProvider};
use crate::retry::{RefreshContext, send_with_refresh};
use crate::token::TokenRefresher;
use crate::transport::{HttpTransport, HttpVerb};

use super::translate;

fn outlook_headers(token: &str) -> Vec<(String, String)> {
    vec![
        ("Authorization".to_string(), format!("Bearer {token}")),
        (
            "Prefer".to_string(),
            "outlook.body-content-type=\"text\"".to_string(),
        ),
    ]
}

/// Office365 provider over the Outlook REST API events collection.
pub struct Office365Provider {
    events_base: String,
    transport: Arc<dyn HttpTransport>,
    refresher: TokenRefresher,
    access_store: Arc<AccessInfoStore>,
}

impl Office365Provider {
    /// Creates a provider rooted at the events collection URL
    /// (`.../api/v2.0/me/events`).
    pub fn new(
        events_base: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        refresher: TokenRefresher,
        access_store: Arc<AccessInfoStore>,
    ) -> Self {
        let events_base = events_base.into().trim_end_matches('/').to_string();
        Self {
            events_base,
            transport,
            refresher,
            access_store,
        }
    }

    fn event_url(&self, src_id: &str) -> String {
        format!("{}/{}", self.events_base, urlencoding::encode(src_id))
    }

    async fn send(
        &self,
        verb: HttpVerb,
        url: String,
        body: Option<String>,
        access: &AccessInfoEntry,
    ) -> SyncResult<crate::transport::WireResponse> {
        let ctx = RefreshContext {
            refresher: &self.refresher,
            access_store: &self.access_store,
            src_type: SourceType::Office365,
            account: &access.src_account_name,
            refresh_token: &access.refresh_token,
        };
        send_with_refresh(ctx, &access.access_token, |token| {
            let transport = Arc::clone(&self.transport);
            let url = url.clone();
            let body = body.clone();
            async move {
                transport
                    .execute(verb, &url, &outlook_headers(&token), body.as_deref())
                    .await
            }
        })
        .await
        .map_err(|e| e.with_provider(SourceType::Office365.as_str()))
    }
}

impl SyncProvider for Office365Provider {
    fn source_type(&self) -> SourceType {
        SourceType::Office365
    }

    fn create<'a>(
        &'a self,
        params: &'a EventParams,
        access: &'a AccessInfoEntry,
    ) -> BoxFuture<'a, SyncResult<EventDraft>> {
        Box::pin(async move {
            let body = translate::to_office365_event(params)?;
            debug!(url = %self.events_base, "creating Office365 event");

            let response = self
                .send(HttpVerb::Post, self.events_base.clone(), Some(body), access)
                .await?;
            if response.status != 201 {
                return Err(SyncError::provider_rejected(response.body)
                    .with_provider(SourceType::Office365.as_str()));
            }
            translate::parse_office365_event(&response.body)
        })
    }

    fn update<'a>(
        &'a self,
        params: &'a EventParams,
        access: &'a AccessInfoEntry,
    ) -> BoxFuture<'a, SyncResult<EventDraft>> {
        Box::pin(async move {
            let src_id = params
                .src_id
                .as_deref()
                .ok_or_else(|| SyncError::missing_parameter("srcId"))?;
            let url = self.event_url(src_id);
            let body = translate::to_office365_event(params)?;
            debug!(url = %url, "updating Office365 event");

            let response = self.send(HttpVerb::Patch, url, Some(body), access).await?;
            if response.status != 200 {
                return Err(SyncError::provider_rejected(response.body)
                    .with_provider(SourceType::Office365.as_str()));
            }
            translate::parse_office365_event(&response.body)
        })
    }

    fn delete<'a>(
        &'a self,
        event: &'a VEvent,
        access: &'a AccessInfoEntry,
    ) -> BoxFuture<'a, SyncResult<()>> {
        Box::pin(async move {
            let url = self.event_url(&event.src_id);
            debug!(url = %url, "deleting Office365 event");

            let response = self.send(HttpVerb::Delete, url, None, access).await?;
            match response.status {
                204 | 404 | 410 => Ok(()),
                _ => Err(
                    SyncError::provider_server("Not delete vEvent of Office365 server.")
                        .with_provider(SourceType::Office365.as_str()),
                ),
            }
        })
    }
}
