//! Internal calendar-event records.
//!
//! This module defines [`VEvent`], the provider-agnostic record persisted in
//! the internal store, plus the ephemeral shapes around it:
//! [`EventParams`] (validated caller input) and [`EventDraft`] (translator
//! output awaiting reconciliation).
//!
//! A `VEvent` is owned by exactly one external provider, identified by its
//! [`SourceType`]. Once created, the source type never changes for the life
//! of the record; update and delete always follow the stored value.

use serde::{Deserialize, Serialize};

/// The external provider that owns an event's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    /// Google Calendar (REST v3).
    Google,
    /// Office365 / Exchange Online via the Outlook REST API.
    Office365,
    /// Exchange Web Services.
    #[serde(rename = "EWS")]
    Ews,
}

impl SourceType {
    /// Returns the wire name used in parameters and stored documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Office365 => "Office365",
            Self::Ews => "EWS",
        }
    }

    /// Parses the wire name. Returns `None` for unsupported providers.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "Google" => Some(Self::Google),
            "Office365" => Some(Self::Office365),
            "EWS" => Some(Self::Ews),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_wire(value).ok_or_else(|| format!("unsupported source type: {value}"))
    }
}

/// The internal calendar-event record.
///
/// All instants (`dtstart`, `dtend`, `src_updated`) are wrapped-epoch strings
/// (`"/Date(<ms>)/"`) produced by [`crate::time`], so the stored format is
/// identical no matter which provider the event came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VEvent {
    /// Internal identifier, the store primary key.
    pub id: String,

    /// The provider that owns this event. Immutable after creation.
    pub src_type: SourceType,

    /// Provider account the event lives under.
    pub src_account_name: String,

    /// The event's identifier in the provider's own system.
    pub src_id: String,

    /// Provider endpoint override. Only populated for EWS.
    pub src_url: Option<String>,

    /// Provider-reported last-modified instant, wrapped-epoch.
    pub src_updated: Option<String>,

    /// Event start, wrapped-epoch.
    pub dtstart: String,

    /// Event end, wrapped-epoch.
    pub dtend: String,

    /// Event title.
    pub summary: Option<String>,

    /// Event body text.
    pub description: Option<String>,

    /// Event location.
    pub location: Option<String>,

    /// Organizer email-like identifier.
    pub organizer: Option<String>,

    /// Ordered attendee identifiers.
    #[serde(default)]
    pub attendees: Vec<String>,
}

/// Provider-confirmed event data before reconciliation.
///
/// A draft carries the candidate internal id the translator derived from the
/// provider response (Google/Office365: the provider id; EWS: the iCal UID)
/// alongside the provider-native id. The reconciliation engine stamps the
/// ownership fields and resolves recurrence collisions before persisting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    /// Candidate internal identifier.
    pub candidate_id: String,
    /// Provider-native identifier.
    pub src_id: String,
    /// Provider-reported last-modified instant, wrapped-epoch.
    pub src_updated: Option<String>,
    /// Event start, wrapped-epoch.
    pub dtstart: String,
    /// Event end, wrapped-epoch.
    pub dtend: String,
    /// Event title.
    pub summary: Option<String>,
    /// Event body text.
    pub description: Option<String>,
    /// Event location.
    pub location: Option<String>,
    /// Organizer email-like identifier.
    pub organizer: Option<String>,
    /// Ordered attendee identifiers.
    pub attendees: Vec<String>,
}

impl EventDraft {
    /// Stamps ownership fields onto the draft, producing a persistable record.
    ///
    /// `id` is the internal identifier decided by the reconciliation engine;
    /// it may differ from `candidate_id` after collision probing.
    pub fn into_vevent(
        self,
        id: impl Into<String>,
        src_type: SourceType,
        src_account_name: impl Into<String>,
        src_url: Option<String>,
    ) -> VEvent {
        VEvent {
            id: id.into(),
            src_type,
            src_account_name: src_account_name.into(),
            src_id: self.src_id,
            src_url,
            src_updated: self.src_updated,
            dtstart: self.dtstart,
            dtend: self.dtend,
            summary: self.summary,
            description: self.description,
            location: self.location,
            organizer: self.organizer,
            attendees: self.attendees,
        }
    }
}

/// Validated caller parameters for a mutation.
///
/// The dispatcher validates presence and shape against the raw JSON object
/// (presence, not truthiness, for update's `summary`/`location`/`description`
/// keys) before deserializing into this typed form. `src_type` stays a plain
/// string here because an update ignores it in favor of the stored record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventParams {
    /// Internal identifier (update/delete).
    pub id: Option<String>,
    /// Requested provider, wire name (create only).
    pub src_type: Option<String>,
    /// Provider account name (create only).
    pub src_account_name: Option<String>,
    /// Provider-native identifier; defaulted from the stored record on update.
    pub src_id: Option<String>,
    /// Event start, in the provider's outbound format.
    pub dtstart: Option<String>,
    /// Event end, in the provider's outbound format.
    pub dtend: Option<String>,
    /// Event title.
    pub summary: Option<String>,
    /// Event body text.
    pub description: Option<String>,
    /// Event location.
    pub location: Option<String>,
    /// Organizer email-like identifier.
    pub organizer: Option<String>,
    /// Attendee identifiers.
    pub attendees: Option<Vec<String>>,
    /// Time zone label forwarded to Office365 outbound bodies.
    pub timezone: Option<String>,
}
