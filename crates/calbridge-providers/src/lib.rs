//! SyncProvider trait and implementations.
//!
//! This crate provides the abstraction layer for the external calendar
//! backends a record can be synchronized against:
//!
//! - [`SyncProvider`] - The core trait each backend implements
//! - [`ProviderRegistry`] - Source-type keyed provider selection
//! - [`AccessInfoStore`] - Per-account credentials with refresh persistence
//! - [`TokenRefresher`] / [`send_with_refresh`] - The shared 401 retry path
//! - [`SyncError`] - Error types with their caller-visible HTTP mapping
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────┐
//! │ Google Calendar  │  │ Outlook REST API │  │ Exchange (EWS)   │
//! └────────┬─────────┘  └────────┬─────────┘  └────────┬─────────┘
//!          │                     │                     │
//!          ▼                     ▼                     ▼
//! ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────┐
//! │ GoogleProvider   │  │ Office365Provider│  │ EwsProvider      │
//! └────────┬─────────┘  └────────┬─────────┘  └────────┬─────────┘
//!          │                     │                     │
//!          │             SyncProvider                  │
//!          └─────────────────────┬─────────────────────┘
//!                                │
//!                                ▼
//!                         ┌────────────┐
//!                         │ EventDraft │
//!                         └────────────┘
//! ```
//!
//! Each implementation owns its wire schema (a pure `translate` module) and
//! its protocol (an executor). Google and Office365 share the
//! refresh-and-retry-once policy in [`retry`]; EWS authenticates per call
//! through the [`ews::EwsGateway`] seam.

pub mod access_info;
pub mod error;
pub mod ews;
pub mod google;
pub mod office365;
pub mod provider;
pub mod retry;
pub mod token;
pub mod transport;

// Re-export main types at crate root
pub use access_info::{AccessInfoEntry, AccessInfoStore, resolve};
pub use error::{SyncError, SyncErrorCode, SyncResult};
pub use ews::{EwsEventData, EwsGateway, EwsProvider, EwsSession};
pub use google::GoogleProvider;
pub use office365::Office365Provider;
pub use provider::{BoxFuture, ProviderRegistry, SyncProvider};
pub use retry::{RefreshContext, send_with_refresh};
pub use token::TokenRefresher;
pub use transport::{HttpTransport, HttpVerb, ReqwestTransport, WireResponse};
