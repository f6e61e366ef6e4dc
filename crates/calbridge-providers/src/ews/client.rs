//! EWS gateway seam.
//!
//! The Exchange protocol itself (SOAP envelopes, NTLM/basic auth) is the
//! gateway implementation's concern. The provider sees only flat event
//! records and a delete status string, which keeps the executor testable
//! against scripted sessions.

use serde::Deserialize;

use calbridge_core::{EventParams, VEvent};

use crate::error::SyncResult;
use crate::provider::BoxFuture;

/// A flat event record as the Exchange side reports it.
///
/// `attendees` arrives comma-joined; [`super::translate`] splits it. `uid`
/// is the item id used for later mutations, `i_cal_uid` the calendar-level
/// identifier used as the candidate internal id.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EwsEventData {
    #[serde(rename = "ICalUid")]
    pub i_cal_uid: String,
    pub uid: String,
    pub start: String,
    pub end: String,
    pub updated: String,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub location: Option<String>,
    pub organizer: Option<String>,
    pub attendees: String,
}

/// An authenticated per-call Exchange session.
pub trait EwsSession: Send + Sync {
    /// Creates an event and returns the server's record of it.
    fn create_event<'a>(
        &'a self,
        params: &'a EventParams,
    ) -> BoxFuture<'a, SyncResult<EwsEventData>>;

    /// Updates the event identified by `params.src_id`.
    fn update_event<'a>(
        &'a self,
        params: &'a EventParams,
    ) -> BoxFuture<'a, SyncResult<EwsEventData>>;

    /// Deletes the event. The Exchange side answers `"OK"` on success.
    fn delete_event<'a>(&'a self, event: &'a VEvent) -> BoxFuture<'a, SyncResult<String>>;
}

/// Opens per-call sessions against an Exchange endpoint.
///
/// `open` failures are configuration errors (bad credentials shape, bad
/// endpoint URL) and must carry `SyncErrorCode::Configuration`.
pub trait EwsGateway: Send + Sync {
    /// Opens a session for the given account against `url`.
    fn open<'a>(
        &'a self,
        account: &'a str,
        password: &'a str,
        url: &'a str,
    ) -> BoxFuture<'a, SyncResult<Box<dyn EwsSession>>>;
}
