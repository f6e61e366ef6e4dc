//! Request dispatcher.
//!
//! One entry point, [`Dispatcher::handle`], maps the request method onto
//! create/update/delete, validates parameters, resolves the stored record
//! and access info, runs the provider mutation, and reconciles the store.
//! Every failure is rendered as a formatted response; nothing escapes as a
//! raw error.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use calbridge_core::{EventParams, SourceType, VEvent};
use calbridge_providers::{
    AccessInfoEntry, AccessInfoStore, ProviderRegistry, SyncError, SyncResult,
};
use calbridge_store::EventStore;

use crate::reconcile::{self, Ownership};
use crate::request::{ApiResponse, MutationRequest};
use crate::validate;

fn no_such_access_entry() -> SyncError {
    SyncError::configuration("no such srcType or srcAccountName")
}

/// The transport-independent request handler.
pub struct Dispatcher {
    store: Arc<dyn EventStore>,
    access_store: Arc<AccessInfoStore>,
    registry: ProviderRegistry,
    max_recur_probes: usize,
}

impl Dispatcher {
    /// Creates a dispatcher over the given store, credentials, and providers.
    pub fn new(
        store: Arc<dyn EventStore>,
        access_store: Arc<AccessInfoStore>,
        registry: ProviderRegistry,
        max_recur_probes: usize,
    ) -> Self {
        Self {
            store,
            access_store,
            registry,
            max_recur_probes,
        }
    }

    /// Handles one request, always producing a renderable response.
    pub async fn handle(&self, request: &MutationRequest) -> ApiResponse {
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(error) => {
                warn!(
                    method = %request.method,
                    code = error.code().as_str(),
                    error = %error.message(),
                    "request failed"
                );
                ApiResponse::from_error(&error)
            }
        }
    }

    async fn dispatch(&self, request: &MutationRequest) -> SyncResult<ApiResponse> {
        match request.method.as_str() {
            "POST" => self.create(request).await,
            "PUT" => self.update(request).await,
            "DELETE" => self.delete(request).await,
            _ => Err(SyncError::method_not_allowed()),
        }
    }

    async fn create(&self, request: &MutationRequest) -> SyncResult<ApiResponse> {
        let raw = request.parameters()?;
        validate::check_create(&raw)?;
        let params: EventParams = serde_json::from_value(Value::Object(raw))
            .map_err(SyncError::malformed_parameter)?;

        // Access info resolves on the raw srcType string, so a provider with
        // no credentials reports the missing entry before the unsupported
        // provider check runs.
        let src_type_raw = params.src_type.as_deref().unwrap_or_default();
        let account = params.src_account_name.as_deref().unwrap_or_default();
        let access = self
            .access_store
            .resolve_raw(src_type_raw, account)
            .ok_or_else(no_such_access_entry)?;
        let src_type =
            SourceType::from_wire(src_type_raw).ok_or_else(SyncError::unsupported_provider)?;

        let provider = self.registry.get(src_type)?;
        let draft = provider.create(&params, &access).await?;

        let event = reconcile::apply_create(
            &self.store,
            draft,
            &self.ownership(src_type, &access),
            self.max_recur_probes,
        )?;
        info!(id = %event.id, src_type = %src_type, "created event");
        Ok(ApiResponse::json(200, &event))
    }

    async fn update(&self, request: &MutationRequest) -> SyncResult<ApiResponse> {
        let raw = request.parameters()?;
        validate::check_update(&raw)?;
        let mut params: EventParams = serde_json::from_value(Value::Object(raw))
            .map_err(SyncError::malformed_parameter)?;

        let stored = self.retrieve_target(&params)?;
        let access = self.resolve_for(&stored)?;

        // The provider-native id defaults from the stored record; callers
        // rarely track it.
        if params.src_id.as_deref().is_none_or(str::is_empty) {
            params.src_id = Some(stored.src_id.clone());
        }

        let provider = self.registry.get(stored.src_type)?;
        let draft = provider.update(&params, &access).await?;

        let event = reconcile::apply_update(
            &self.store,
            &stored,
            draft,
            &self.ownership(stored.src_type, &access),
        )?;
        info!(id = %event.id, src_type = %event.src_type, "updated event");
        Ok(ApiResponse::json(200, &event))
    }

    async fn delete(&self, request: &MutationRequest) -> SyncResult<ApiResponse> {
        let raw = request.parameters()?;
        validate::check_delete(&raw)?;
        let params: EventParams = serde_json::from_value(Value::Object(raw))
            .map_err(SyncError::malformed_parameter)?;

        let stored = self.retrieve_target(&params)?;
        let access = self.resolve_for(&stored)?;

        let provider = self.registry.get(stored.src_type)?;
        provider.delete(&stored, &access).await?;

        reconcile::apply_delete(&self.store, &stored.id)?;
        info!(id = %stored.id, src_type = %stored.src_type, "deleted event");
        Ok(ApiResponse::no_content())
    }

    fn retrieve_target(&self, params: &EventParams) -> SyncResult<VEvent> {
        let id = params
            .id
            .as_deref()
            .ok_or_else(|| SyncError::missing_parameter("id"))?;
        self.store.retrieve(id).map_err(|e| {
            if e.is_not_found() {
                SyncError::no_such_id()
            } else {
                SyncError::store(e.to_string())
            }
        })
    }

    fn resolve_for(&self, stored: &VEvent) -> SyncResult<AccessInfoEntry> {
        self.access_store
            .resolve_entry(stored.src_type, &stored.src_account_name)
            .ok_or_else(no_such_access_entry)
    }

    fn ownership(&self, src_type: SourceType, access: &AccessInfoEntry) -> Ownership {
        let src_url = match src_type {
            SourceType::Ews => Some(access.src_url.clone()),
            SourceType::Google | SourceType::Office365 => None,
        };
        Ownership {
            src_type,
            src_account_name: access.src_account_name.clone(),
            src_url,
        }
    }
}
