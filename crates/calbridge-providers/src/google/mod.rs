//! Google Calendar provider.
//!
//! Mutations go to the Calendar API v3 events collection with a bearer
//! token; a 401 (or unreachable provider) triggers one token refresh and
//! retry. The wire schema lives in [`translate`], the protocol in
//! [`executor`].

mod executor;
pub mod translate;

pub use executor::GoogleProvider;
