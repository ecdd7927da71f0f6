//! Shared types: the normalized event, RSVPs, attendee projections and ID aliases.

pub mod event;
pub mod ids;

pub use event::{
    Category, CreateEventRequest, Event, EventAttendee, EventAttendees, EventsPage, Rsvp,
    RsvpStatus, UpdateEventRequest, EVENT_TYPES, USER_SOURCE,
};
pub use ids::{EventId, RsvpId, UserId};
