//! Office365 wire schema (Outlook REST API).
//!
//! PascalCase bodies. Outbound instants pass through verbatim with the
//! caller's timezone label (empty string when absent). Inbound instants are
//! truncated to millisecond precision (23 characters) and read as UTC, a
//! fixed workaround for the API's seven-digit fractional seconds.

use serde::{Deserialize, Serialize};

use calbridge_core::{EventDraft, EventParams, parse_office365_instant, wrap_epoch};

use crate::error::{SyncError, SyncResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct OutboundInstant<'a> {
    date_time: &'a str,
    time_zone: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct OutboundBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct OutboundLocation<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct OutboundAddress<'a> {
    address: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct OutboundRecipient<'a> {
    email_address: OutboundAddress<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct OutboundEvent<'a> {
    start: OutboundInstant<'a>,
    end: OutboundInstant<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<&'a str>,
    body: OutboundBody<'a>,
    location: OutboundLocation<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    organizer: Option<OutboundRecipient<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attendees: Option<Vec<OutboundRecipient<'a>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InboundInstant {
    date_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InboundBody {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InboundLocation {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InboundAddress {
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InboundRecipient {
    email_address: Option<InboundAddress>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InboundEvent {
    id: String,
    start: InboundInstant,
    end: InboundInstant,
    last_modified_date_time: Option<String>,
    subject: Option<String>,
    body: Option<InboundBody>,
    location: Option<InboundLocation>,
    organizer: Option<InboundRecipient>,
    #[serde(default)]
    attendees: Vec<InboundRecipient>,
}

fn recipient(address: &str) -> OutboundRecipient<'_> {
    OutboundRecipient {
        email_address: OutboundAddress {
            address,
            name: address,
        },
    }
}

/// Renders the outbound JSON body for an Office365 mutation.
pub fn to_office365_event(params: &EventParams) -> SyncResult<String> {
    let dtstart = params
        .dtstart
        .as_deref()
        .ok_or_else(|| SyncError::missing_parameter("dtstart"))?;
    let dtend = params
        .dtend
        .as_deref()
        .ok_or_else(|| SyncError::missing_parameter("dtend"))?;
    let time_zone = params.timezone.as_deref().unwrap_or("");

    let event = OutboundEvent {
        start: OutboundInstant {
            date_time: dtstart,
            time_zone,
        },
        end: OutboundInstant {
            date_time: dtend,
            time_zone,
        },
        subject: params.summary.as_deref(),
        body: OutboundBody {
            content: params.description.as_deref(),
        },
        location: OutboundLocation {
            display_name: params.location.as_deref(),
        },
        organizer: params.organizer.as_deref().map(recipient),
        attendees: params
            .attendees
            .as_ref()
            .map(|list| list.iter().map(|a| recipient(a)).collect()),
    };

    serde_json::to_string(&event)
        .map_err(|e| SyncError::internal(format!("failed to serialize Office365 event: {e}")))
}

fn wrapped(value: &str) -> SyncResult<String> {
    Ok(wrap_epoch(parse_office365_instant(value)?))
}

/// Parses an Outlook event resource into a draft.
pub fn parse_office365_event(body: &str) -> SyncResult<EventDraft> {
    let event: InboundEvent = serde_json::from_str(body)
        .map_err(|e| SyncError::internal(format!("invalid Office365 event response: {e}")))?;

    let src_updated = event
        .last_modified_date_time
        .as_deref()
        .map(wrapped)
        .transpose()?;

    Ok(EventDraft {
        candidate_id: event.id.clone(),
        src_id: event.id,
        src_updated,
        dtstart: wrapped(&event.start.date_time)?,
        dtend: wrapped(&event.end.date_time)?,
        summary: event.subject,
        description: event.body.and_then(|b| b.content),
        location: event.location.and_then(|l| l.display_name),
        organizer: event
            .organizer
            .and_then(|r| r.email_address)
            .and_then(|a| a.address),
        attendees: event
            .attendees
            .into_iter()
            .filter_map(|r| r.email_address.and_then(|a| a.address))
            .collect(),
    })
}
