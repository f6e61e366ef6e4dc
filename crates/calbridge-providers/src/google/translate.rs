//! Google Calendar wire schema.
//!
//! Pure translation between the caller's [`EventParams`] / the provider's
//! event resource and the internal [`EventDraft`]. Outbound instants pass
//! through verbatim (the caller supplies RFC 3339); inbound instants become
//! wrapped-epoch strings. Both the candidate internal id and `src_id` come
//! from the provider `id`.

use serde::{Deserialize, Serialize};

use calbridge_core::{
    EventDraft, EventParams, parse_flexible_instant, parse_google_instant, wrap_epoch,
};

use crate::error::{SyncError, SyncResult};

#[derive(Debug, Serialize)]
struct OutboundInstant<'a> {
    #[serde(rename = "dateTime")]
    date_time: &'a str,
}

#[derive(Debug, Serialize)]
struct OutboundEmail<'a> {
    email: &'a str,
}

/// Outbound event body for create (POST) and update (PUT).
#[derive(Debug, Serialize)]
struct OutboundEvent<'a> {
    start: OutboundInstant<'a>,
    end: OutboundInstant<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    organizer: Option<OutboundEmail<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attendees: Option<Vec<OutboundEmail<'a>>>,
}

#[derive(Debug, Deserialize)]
struct InboundInstant {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InboundEmail {
    email: Option<String>,
}

/// Inbound event resource from a create/update response.
#[derive(Debug, Deserialize)]
struct InboundEvent {
    id: String,
    start: Option<InboundInstant>,
    end: Option<InboundInstant>,
    updated: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    organizer: Option<InboundEmail>,
    attendees: Option<Vec<InboundEmail>>,
}

/// Renders the outbound JSON body for a Google mutation.
///
/// `dtstart`/`dtend` are validated present by the dispatcher before the
/// provider runs; their absence here is an internal fault.
pub fn to_google_event(params: &EventParams) -> SyncResult<String> {
    let dtstart = params
        .dtstart
        .as_deref()
        .ok_or_else(|| SyncError::missing_parameter("dtstart"))?;
    let dtend = params
        .dtend
        .as_deref()
        .ok_or_else(|| SyncError::missing_parameter("dtend"))?;

    let event = OutboundEvent {
        start: OutboundInstant { date_time: dtstart },
        end: OutboundInstant { date_time: dtend },
        summary: params.summary.as_deref(),
        description: params.description.as_deref(),
        location: params.location.as_deref(),
        organizer: params
            .organizer
            .as_deref()
            .map(|email| OutboundEmail { email }),
        attendees: params
            .attendees
            .as_ref()
            .map(|list| list.iter().map(|email| OutboundEmail { email }).collect()),
    };

    serde_json::to_string(&event)
        .map_err(|e| SyncError::internal(format!("failed to serialize Google event: {e}")))
}

fn instant_of(value: Option<&InboundInstant>) -> SyncResult<String> {
    let instant = value
        .map(|v| parse_google_instant(v.date_time.as_deref(), v.date.as_deref()))
        .transpose()?
        .ok_or_else(|| SyncError::invalid_date("Google event is missing start or end"))?;
    Ok(wrap_epoch(instant))
}

/// Parses a Google event resource into a draft.
pub fn parse_google_event(body: &str) -> SyncResult<EventDraft> {
    let event: InboundEvent = serde_json::from_str(body)
        .map_err(|e| SyncError::internal(format!("invalid Google event response: {e}")))?;

    let src_updated = event
        .updated
        .as_deref()
        .map(parse_flexible_instant)
        .transpose()?
        .map(wrap_epoch);

    Ok(EventDraft {
        candidate_id: event.id.clone(),
        src_id: event.id,
        src_updated,
        dtstart: instant_of(event.start.as_ref())?,
        dtend: instant_of(event.end.as_ref())?,
        summary: event.summary,
        description: event.description,
        location: event.location,
        organizer: event.organizer.and_then(|o| o.email),
        attendees: event
            .attendees
            .map(|list| list.into_iter().filter_map(|a| a.email).collect())
            .unwrap_or_default(),
    })
}
