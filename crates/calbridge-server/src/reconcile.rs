//! Reconciliation engine.
//!
//! After a provider confirms a mutation, the internal store is brought in
//! line. Creation is the interesting case: recurring-event instances share
//! one calendar-level identifier, so the candidate internal id may already
//! be taken by a sibling instance. The engine probes `<id>_recur_1`,
//! `<id>_recur_2`, ... for a free slot, and treats an occupant with the same
//! provider-native id as a true duplicate rather than a sibling.

use std::sync::Arc;

use tracing::{debug, warn};

use calbridge_core::{EventDraft, SourceType, VEvent};
use calbridge_providers::{SyncError, SyncResult};
use calbridge_store::{EventStore, StoreError};

fn store_error(error: StoreError) -> SyncError {
    SyncError::store(error.to_string())
}

/// Ownership fields stamped onto every reconciled record.
#[derive(Debug, Clone)]
pub struct Ownership {
    pub src_type: SourceType,
    pub src_account_name: String,
    /// Populated for EWS only.
    pub src_url: Option<String>,
}

/// Persists a freshly created event, resolving recurrence collisions.
///
/// Returns the stored record re-read from the store. The probe loop is
/// bounded by `max_probes`; exceeding it is a server fault rather than an
/// unbounded scan.
pub fn apply_create(
    store: &Arc<dyn EventStore>,
    draft: EventDraft,
    ownership: &Ownership,
    max_probes: usize,
) -> SyncResult<VEvent> {
    let base_id = draft.candidate_id.clone();

    let mut occupant = match store.retrieve(&base_id) {
        Err(e) if e.is_not_found() => {
            return create_at(store, draft, &base_id, ownership);
        }
        Ok(event) => event,
        Err(e) => return Err(store_error(e)),
    };

    for probe in 1..=max_probes {
        if occupant.src_id == draft.src_id {
            warn!(id = %occupant.id, src_id = %occupant.src_id, "duplicate provider event");
            return Err(SyncError::consistency_fault());
        }
        let candidate = format!("{base_id}_recur_{probe}");
        match store.retrieve(&candidate) {
            Err(e) if e.is_not_found() => {
                debug!(id = %candidate, probes = probe, "resolved recurrence collision");
                return create_at(store, draft, &candidate, ownership);
            }
            Ok(event) => occupant = event,
            Err(e) => return Err(store_error(e)),
        }
    }

    Err(SyncError::internal(format!(
        "recurrence collision probe limit ({max_probes}) exceeded for {base_id}"
    )))
}

fn create_at(
    store: &Arc<dyn EventStore>,
    draft: EventDraft,
    id: &str,
    ownership: &Ownership,
) -> SyncResult<VEvent> {
    let event = draft.into_vevent(
        id,
        ownership.src_type,
        ownership.src_account_name.clone(),
        ownership.src_url.clone(),
    );
    store.create(&event).map_err(store_error)?;
    store.retrieve(id).map_err(store_error)
}

/// Overwrites the stored record at its existing id after a provider update.
///
/// The stored id and `src_type` survive regardless of what the provider
/// reported; only the event content changes.
pub fn apply_update(
    store: &Arc<dyn EventStore>,
    stored: &VEvent,
    draft: EventDraft,
    ownership: &Ownership,
) -> SyncResult<VEvent> {
    let event = draft.into_vevent(
        stored.id.clone(),
        stored.src_type,
        ownership.src_account_name.clone(),
        ownership.src_url.clone(),
    );
    store.update(&stored.id, &event).map_err(store_error)?;
    store.retrieve(&stored.id).map_err(store_error)
}

/// Removes the stored record after the provider confirmed deletion.
pub fn apply_delete(store: &Arc<dyn EventStore>, id: &str) -> SyncResult<()> {
    store.delete(id).map_err(store_error)
}
