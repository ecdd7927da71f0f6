//! Stable identifiers for feed events.
//!
//! A feed event's id is a name-based (v5) UUID of `"{source}-{external_id}"`
//! in the OID namespace, so the same upstream record always maps to the same
//! [`EventId`] whether it is read from the feed or from a backfilled row.

use uuid::Uuid;

use crate::models::EventId;

/// The value stored in `events.external_id` for a feed record.
pub fn external_key(source: &str, external_id: &str) -> String {
    format!("{}-{}", source, external_id)
}

pub fn stable_id(source: &str, external_id: &str) -> EventId {
    Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        external_key(source, external_id).as_bytes(),
    )
}
