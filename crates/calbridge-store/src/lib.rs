//! Internal VEvent store.
//!
//! The synchronization engine only ever touches the internal store through
//! the [`EventStore`] trait: retrieve, create, update, delete by internal
//! identifier. The reconciliation probe loop keys on
//! [`StoreError::NotFound`] to find a free identifier, so backends must
//! report misses with that variant rather than a generic error.
//!
//! Two backends are provided: [`MemoryEventStore`] for tests and embedding,
//! and [`JsonFileEventStore`] persisting the whole record set as one JSON
//! document with an atomic write.

mod error;
mod store;

pub use error::{StoreError, StoreResult};
pub use store::{EventStore, JsonFileEventStore, MemoryEventStore};
