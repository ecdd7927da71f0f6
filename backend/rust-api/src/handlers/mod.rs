pub mod events;
pub mod rsvp;

pub use events::{
    create_event, delete_event, event_attendees, get_event, list_events, my_events,
    trending_events, update_event, upcoming_events, EventsQuery, TrendingQuery,
};
pub use rsvp::{delete_rsvp, get_rsvp, my_rsvps, upsert_rsvp, RsvpRequest};
