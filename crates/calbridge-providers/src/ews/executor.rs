//! EWS mutation protocol.

use std::sync::Arc;

use tracing::debug;

use calbridge_core::{EventDraft, EventParams, SourceType, VEvent};

use crate::access_info::AccessInfoEntry;
use crate::error::{SyncError, SyncResult};
use crate::provider::{BoxFuture, SyncProvider};

use super::client::{EwsGateway, EwsSession};
use super::translate;

/// EWS provider. Every mutation opens a fresh gateway session from the
/// access-info entry's account, password, and endpoint.
pub struct EwsProvider {
    gateway: Arc<dyn EwsGateway>,
}

impl EwsProvider {
    /// Creates a provider over the given gateway.
    pub fn new(gateway: Arc<dyn EwsGateway>) -> Self {
        Self { gateway }
    }

    async fn session(&self, access: &AccessInfoEntry) -> SyncResult<Box<dyn EwsSession>> {
        debug!(
            account = %access.src_account_name,
            url = %access.src_url,
            "opening EWS session"
        );
        self.gateway
            .open(&access.src_account_name, &access.pw, &access.src_url)
            .await
            .map_err(|e| e.with_provider(SourceType::Ews.as_str()))
    }
}

impl SyncProvider for EwsProvider {
    fn source_type(&self) -> SourceType {
        SourceType::Ews
    }

    fn create<'a>(
        &'a self,
        params: &'a EventParams,
        access: &'a AccessInfoEntry,
    ) -> BoxFuture<'a, SyncResult<EventDraft>> {
        Box::pin(async move {
            let session = self.session(access).await?;
            let data = session
                .create_event(params)
                .await
                .map_err(|e| e.with_provider(SourceType::Ews.as_str()))?;
            translate::from_ews_event(data)
        })
    }

    fn update<'a>(
        &'a self,
        params: &'a EventParams,
        access: &'a AccessInfoEntry,
    ) -> BoxFuture<'a, SyncResult<EventDraft>> {
        Box::pin(async move {
            let session = self.session(access).await?;
            let data = session
                .update_event(params)
                .await
                .map_err(|e| e.with_provider(SourceType::Ews.as_str()))?;
            translate::from_ews_event(data)
        })
    }

    fn delete<'a>(
        &'a self,
        event: &'a VEvent,
        access: &'a AccessInfoEntry,
    ) -> BoxFuture<'a, SyncResult<()>> {
        Box::pin(async move {
            let session = self.session(access).await?;
            let result = session
                .delete_event(event)
                .await
                .map_err(|e| e.with_provider(SourceType::Ews.as_str()))?;
            if result == "OK" {
                Ok(())
            } else {
                Err(SyncError::provider_server("Not delete vEvent of EWS server.")
                    .with_provider(SourceType::Ews.as_str()))
            }
        })
    }
}
