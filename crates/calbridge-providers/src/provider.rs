//! SyncProvider trait definition.
//!
//! This module defines the [`SyncProvider`] trait, the capability set each
//! external calendar backend implements: translate the caller's parameters
//! outbound, perform the remote mutation, translate the provider's response
//! inbound into an [`EventDraft`]. One implementation exists per
//! [`SourceType`]; the [`ProviderRegistry`] selects it, which replaces the
//! parallel per-provider conditional blocks of older designs with a single
//! dispatch point.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use calbridge_core::{EventDraft, EventParams, SourceType, VEvent};

use crate::access_info::AccessInfoEntry;
use crate::error::{SyncError, SyncResult};

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object-safe so the dispatcher can hold
/// providers behind `dyn SyncProvider`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The capability set for one external calendar provider.
///
/// Implementations own their wire schema and remote protocol, including the
/// 401-refresh-retry path where the provider uses bearer tokens. They never
/// touch the internal event store; the reconciliation engine does that with
/// the returned draft.
pub trait SyncProvider: Send + Sync {
    /// The source type this provider handles.
    fn source_type(&self) -> SourceType;

    /// Creates the event remotely and returns the provider-confirmed draft.
    fn create<'a>(
        &'a self,
        params: &'a EventParams,
        access: &'a AccessInfoEntry,
    ) -> BoxFuture<'a, SyncResult<EventDraft>>;

    /// Updates the event remotely and returns the provider-confirmed draft.
    fn update<'a>(
        &'a self,
        params: &'a EventParams,
        access: &'a AccessInfoEntry,
    ) -> BoxFuture<'a, SyncResult<EventDraft>>;

    /// Deletes the event remotely. Success includes "already gone".
    fn delete<'a>(
        &'a self,
        event: &'a VEvent,
        access: &'a AccessInfoEntry,
    ) -> BoxFuture<'a, SyncResult<()>>;
}

impl std::fmt::Debug for dyn SyncProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncProvider")
            .field("source_type", &self.source_type())
            .finish()
    }
}

/// Provider lookup keyed by source type.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<SourceType, Arc<dyn SyncProvider>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider under its own source type.
    pub fn register(&mut self, provider: Arc<dyn SyncProvider>) {
        self.providers.insert(provider.source_type(), provider);
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, provider: Arc<dyn SyncProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Returns the provider for the given source type.
    ///
    /// An unregistered source type is an unsupported-provider error, the
    /// same failure a caller gets for a source type that never existed.
    pub fn get(&self, src_type: SourceType) -> SyncResult<&Arc<dyn SyncProvider>> {
        self.providers
            .get(&src_type)
            .ok_or_else(SyncError::unsupported_provider)
    }
}
