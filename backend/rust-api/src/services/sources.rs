//! The two event sources the aggregation service composes: the third-party
//! feed and the local Postgres store.

use axum::async_trait;
use chrono::{DateTime, Utc};

use crate::error::FeedError;
use crate::models::{Category, Event, EventAttendees, EventId, Rsvp, RsvpStatus, UserId};

/// Read-only access to an external calendar feed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventFeed: Send + Sync {
    /// Current and upcoming events, soonest first. `city` may be empty.
    async fn list_events(
        &self,
        city: &str,
        category: Option<Category>,
        limit: usize,
    ) -> Result<Vec<Event>, FeedError>;

    /// Look an event up by its stable identifier.
    async fn fetch_by_id(&self, id: EventId) -> Result<Event, FeedError>;
}

/// Filters for local event listings. `None` means "don't filter".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub city: Option<String>,
    pub category: Option<Category>,
    pub limit: i64,
    pub offset: i64,
}

/// Durable storage for user-created and backfilled events and their RSVPs.
///
/// Soft-deleted events are never returned.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert, or update the descriptive fields of, the event with this id.
    /// Engagement counters are left untouched.
    async fn upsert_event(&self, event: &Event) -> Result<Event, sqlx::Error>;

    async fn get_event(&self, id: EventId) -> Result<Option<Event>, sqlx::Error>;

    async fn get_events_by_ids(&self, ids: &[EventId]) -> Result<Vec<Event>, sqlx::Error>;

    /// Events matching `filter` regardless of date, soonest first.
    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, sqlx::Error>;

    /// Events starting at or after `from`, soonest first.
    async fn list_upcoming(
        &self,
        filter: &EventFilter,
        from: DateTime<Utc>,
    ) -> Result<Vec<Event>, sqlx::Error>;

    /// Events created by `user_id`, newest first.
    async fn list_user_events(&self, user_id: UserId) -> Result<Vec<Event>, sqlx::Error>;

    async fn update_event(&self, event: &Event) -> Result<Option<Event>, sqlx::Error>;

    /// Returns false when there was no live event to delete.
    async fn soft_delete_event(&self, id: EventId) -> Result<bool, sqlx::Error>;

    /// Insert or overwrite the RSVP for `(event_id, user_id)` and refresh the
    /// event's counters.
    async fn upsert_rsvp(
        &self,
        event_id: EventId,
        user_id: UserId,
        status: RsvpStatus,
    ) -> Result<Rsvp, sqlx::Error>;

    /// Returns false when there was no RSVP to delete.
    async fn delete_rsvp(&self, event_id: EventId, user_id: UserId) -> Result<bool, sqlx::Error>;

    async fn get_rsvp(&self, event_id: EventId, user_id: UserId)
        -> Result<Option<Rsvp>, sqlx::Error>;

    /// A user's RSVPs, newest first.
    async fn list_user_rsvps(
        &self,
        user_id: UserId,
        status: Option<RsvpStatus>,
    ) -> Result<Vec<Rsvp>, sqlx::Error>;

    /// An event's RSVPs, newest first.
    async fn list_event_rsvps(
        &self,
        event_id: EventId,
        status: Option<RsvpStatus>,
    ) -> Result<Vec<Rsvp>, sqlx::Error>;

    async fn get_attendees(&self, event_id: EventId) -> Result<EventAttendees, sqlx::Error>;
}
