//! Type aliases for entity IDs. All are UUIDs; validation happens at parse boundaries (e.g. Uuid::parse_str).

use uuid::Uuid;

use crate::error::ServiceError;

pub type UserId = Uuid;
pub type EventId = Uuid;
pub type RsvpId = Uuid;

/// Parse a path segment into a UUID. Use at API boundaries.
pub fn parse_uuid(id: &str, name: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(id).map_err(|e| ServiceError::Validation(format!("Invalid {}: {}", name, e)))
}
