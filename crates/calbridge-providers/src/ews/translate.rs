//! EWS inbound translation.
//!
//! Flat gateway records become drafts with wrapped-epoch instants. Attendees
//! split on `,` without trimming; the candidate internal id is the iCal UID,
//! `src_id` the Exchange item UID.

use calbridge_core::{EventDraft, parse_flexible_instant, wrap_epoch};

use crate::error::SyncResult;

use super::client::EwsEventData;

fn wrapped(value: &str) -> SyncResult<String> {
    Ok(wrap_epoch(parse_flexible_instant(value)?))
}

/// Converts a gateway event record into a draft.
pub fn from_ews_event(data: EwsEventData) -> SyncResult<EventDraft> {
    let attendees = if data.attendees.is_empty() {
        Vec::new()
    } else {
        data.attendees.split(',').map(String::from).collect()
    };

    Ok(EventDraft {
        candidate_id: data.i_cal_uid,
        src_id: data.uid,
        src_updated: Some(wrapped(&data.updated)?),
        dtstart: wrapped(&data.start)?,
        dtend: wrapped(&data.end)?,
        summary: data.subject,
        description: data.body,
        location: data.location,
        organizer: data.organizer,
        attendees,
    })
}
