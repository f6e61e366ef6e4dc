//! Office365 provider (Outlook REST API v2.0).
//!
//! Same bearer-token protocol as Google with a PascalCase wire schema,
//! PATCH for updates, and the `Prefer: outlook.body-content-type="text"`
//! header so event bodies come back as plain text.

mod executor;
pub mod translate;

pub use executor::Office365Provider;
