//! The normalized, source-agnostic event plus RSVP and attendee shapes.
//! Feed records and database rows are both converted into [`Event`] before the
//! aggregation pipeline sees them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{EventId, RsvpId, UserId};

/// Provenance tag for events created through this API.
pub const USER_SOURCE: &str = "user";

/// Allowed values for the optional `event_type` tag.
pub const EVENT_TYPES: &[&str] = &[
    "party",
    "concert",
    "gaming",
    "hangout",
    "reading",
    "hiking",
    "travel",
    "show",
    "art",
    "sports",
    "dining",
    "coffee",
    "workshop",
    "networking",
    "movie",
    "outdoor",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Concerts,
    Festivals,
    Sports,
    Markets,
    Nightlife,
    Clubs,
    #[default]
    Culture,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Concerts => "concerts",
            Category::Festivals => "festivals",
            Category::Sports => "sports",
            Category::Markets => "markets",
            Category::Nightlife => "nightlife",
            Category::Clubs => "clubs",
            Category::Culture => "culture",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "concerts" => Some(Category::Concerts),
            "festivals" => Some(Category::Festivals),
            "sports" => Some(Category::Sports),
            "markets" => Some(Category::Markets),
            "nightlife" => Some(Category::Nightlife),
            "clubs" => Some(Category::Clubs),
            "culture" => Some(Category::Culture),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub city: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    pub is_free: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer_contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_capacity: Option<i32>,
    pub going_count: i32,
    pub interested_count: i32,
    /// `"user"` or the feed's source name.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
}

impl Event {
    pub fn is_user_created(&self) -> bool {
        self.source == USER_SOURCE
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    Going,
    Interested,
}

impl RsvpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpStatus::Going => "going",
            RsvpStatus::Interested => "interested",
        }
    }

    /// Exact, case-sensitive match: anything but `going`/`interested` is rejected.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "going" => Some(RsvpStatus::Going),
            "interested" => Some(RsvpStatus::Interested),
            _ => None,
        }
    }
}

impl std::fmt::Display for RsvpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rsvp {
    pub id: RsvpId,
    pub event_id: EventId,
    pub user_id: UserId,
    pub status: RsvpStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventAttendee {
    pub user_id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub status: RsvpStatus,
    pub rsvped_at: DateTime<Utc>,
}

/// Attendees split by status, most recent RSVP first in each list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventAttendees {
    pub going: Vec<EventAttendee>,
    pub interested: Vec<EventAttendee>,
    pub going_count: usize,
    pub interested_count: usize,
}

impl EventAttendees {
    /// Split attendees (already ordered most recent first) into going/interested.
    pub fn from_ordered(attendees: Vec<EventAttendee>) -> Self {
        let (going, interested): (Vec<_>, Vec<_>) = attendees
            .into_iter()
            .partition(|a| a.status == RsvpStatus::Going);
        Self {
            going_count: going.len(),
            interested_count: interested.len(),
            going,
            interested,
        }
    }
}

/// Main listing: a page of the current feed, the carousel, and the pre-pagination total.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EventsPage {
    pub current: Vec<Event>,
    pub upcoming: Vec<Event>,
    pub total: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: String,
    pub address: Option<String>,
    pub city: String,
    pub category: String,
    pub event_type: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<String>,
    #[serde(default)]
    pub is_free: bool,
    pub organizer_name: Option<String>,
    pub organizer_contact: Option<String>,
    pub ticket_url: Option<String>,
    pub max_capacity: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub event_type: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub is_free: Option<bool>,
    pub organizer_name: Option<String>,
    pub organizer_contact: Option<String>,
    pub ticket_url: Option<String>,
    pub max_capacity: Option<i32>,
}
