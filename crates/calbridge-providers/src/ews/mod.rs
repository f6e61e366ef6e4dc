//! Exchange Web Services provider.
//!
//! EWS has no bearer-token path; each mutation opens a per-call session with
//! the account name, password, and endpoint URL from the access-info entry.
//! The SOAP plumbing lives behind the [`EwsGateway`] seam, so the provider
//! only deals in the gateway's flat event records.

mod client;
mod executor;
pub mod translate;

pub use client::{EwsEventData, EwsGateway, EwsSession};
pub use executor::EwsProvider;
