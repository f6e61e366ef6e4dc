//! Google Calendar mutation protocol.

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

fn bearer_headers(token: &str) -> Vec<(String, String)> {
    vec![("Authorization".to_string(), format!("Bearer {token}"))]
}

/// Google Calendar provider over the Calendar API v3.
pub struct GoogleProvider {
    calendars_base: String,
    transport: Arc<dyn HttpTransport>,
    refresher: TokenRefresher,
    access_store: Arc<AccessInfoStore>,
}

impl GoogleProvider {
    /// Creates a provider rooted at the calendars collection URL
    /// (`.../calendar/v3/calendars`).
    pub fn new(
        calendars_base: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        refresher: TokenRefresher,
        access_store: Arc<AccessInfoStore>,
    ) -> Self {
        let calendars_base = calendars_base.into().trim_end_matches('/').to_string();
        Self {
            calendars_base,
            transport,
            refresher,
            access_store,
        }
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/{}/events",
            self.calendars_base,
            urlencoding::encode(calendar_id)
        )
    }

    fn event_url(&self, calendar_id: &str, src_id: &str) -> String {
        format!(
            "{}/{}",
            self.events_url(calendar_id),
            urlencoding::encode(src_id)
        )
    }

    fn refresh_context<'a>(&'a self, access: &'a AccessInfoEntry) -> RefreshContext<'a> {
        RefreshContext {
            refresher: &self.refresher,
            access_store: &self.access_store,
            src_type: SourceType::Google,
            account: &access.src_account_name,
            refresh_token: &access.refresh_token,
        }
    }

    async fn send(
        &self,
        verb: HttpVerb,
        url: String,
        body: Option<String>,
        access: &AccessInfoEntry,
    ) -> SyncResult<crate::transport::WireResponse> {
        let ctx = self.refresh_context(access);
        send_with_refresh(ctx, &access.access_token, |token| {
            let transport = Arc::clone(&self.transport);
            let url = url.clone();
            let body = body.clone();
            async move {
                transport
                    .execute(verb, &url, &bearer_headers(&token), body.as_deref())
                    .await
            }
        })
        .await
        .map_err(|e| e.with_provider(SourceType::Google.as_str()))
    }
}

impl SyncProvider for GoogleProvider {
    fn source_type(&self) -> SourceType {
        SourceType::Google
    }

    fn create<'a>(
        &'a self,
        params: &'a EventParams,
        access: &'a AccessInfoEntry,
    ) -> BoxFuture<'a, SyncResult<EventDraft>> {
        Box::pin(async move {
            let url = self.events_url(&access.calendar_id);
            let body = translate::to_google_event(params)?;
            debug!(url = %url, "creating Google event");

            let response = self
                .send(HttpVerb::Post, url, Some(body), access)
                .await?;
            if response.status != 200 {
                return Err(SyncError::provider_rejected(response.body)
                    .with_provider(SourceType::Google.as_str()));
            }
            translate::parse_google_event(&response.body)
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
            let url = self.event_url(&access.calendar_id, src_id);
            let body = translate::to_google_event(params)?;
            debug!(url = %url, "updating Google event");

            let response = self.send(HttpVerb::Put, url, Some(body), access).await?;
            if response.status != 200 {
                return Err(SyncError::provider_rejected(response.body)
                    .with_provider(SourceType::Google.as_str()));
            }
            translate::parse_google_event(&response.body)
        })
    }

    fn delete<'a>(
        &'a self,
        event: &'a VEvent,
        access: &'a AccessInfoEntry,
    ) -> BoxFuture<'a, SyncResult<()>> {
        Box::pin(async move {
            let url = self.event_url(&access.calendar_id, &event.src_id);
            debug!(url = %url, "deleting Google event");

            let response = self.send(HttpVerb::Delete, url, None, access).await?;
            // 404/410 mean the event is already gone, which is the outcome
            // the caller asked for.
            match response.status {
                204 | 404 | 410 => Ok(()),
                _ => Err(SyncError::provider_server("Not delete vEvent of Google server.")
                    .with_provider(SourceType::Google.as_str())),
            }
        })
    }
}
