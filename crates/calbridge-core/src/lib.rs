//! Core types: source providers, VEvent records, wrapped-epoch timestamps

pub mod time;
pub mod tracing;
pub mod vevent;

pub use time::{
    TimeParseError, parse_flexible_instant, parse_google_instant, parse_office365_instant,
    unwrap_epoch, wrap_epoch,
};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use vevent::{EventDraft, EventParams, SourceType, VEvent};
