//! Event aggregation across the feed and the local store, plus the RSVP and
//! local-event lifecycle built on top of it.
//!
//! Read paths degrade: a failing source contributes no events and the request
//! still succeeds with whatever the other source returned. Write paths (RSVPs,
//! backfill, event edits) always surface their errors.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{FeedError, ServiceError};
use crate::models::{
    Category, CreateEventRequest, Event, EventAttendees, EventId, EventsPage, Rsvp, RsvpStatus,
    UpdateEventRequest, UserId, EVENT_TYPES, USER_SOURCE,
};
use crate::services::sources::{EventFeed, EventFilter, EventStore};
use crate::services::timeline::{
    apply_engagement, carousel, happening_today, merge_with_local_precedence, paginate,
    sort_soonest_first, split_current_upcoming, starting_from,
};
use crate::utils::date::DayWindow;

/// Feed events fetched for the cross-category carousel.
pub const CAROUSEL_FETCH_LIMIT: usize = 50;
/// Feed events fetched for the paginated main listing.
pub const MAIN_FEED_FETCH_LIMIT: usize = 300;
/// Local events are few; they are read in one bounded query.
pub const LOCAL_FETCH_LIMIT: i64 = 1000;
pub const CAROUSEL_SIZE: usize = 20;
pub const TRENDING_FETCH_LIMIT: usize = 100;
pub const LEGACY_MIN_FEED_FETCH: usize = 150;

#[derive(Clone)]
pub struct EventService {
    feed: Arc<dyn EventFeed>,
    store: Arc<dyn EventStore>,
}

impl EventService {
    pub fn new(feed: Arc<dyn EventFeed>, store: Arc<dyn EventStore>) -> Self {
        Self { feed, store }
    }

    /// Feed events, or none if the feed fails.
    async fn feed_or_empty(
        &self,
        city: &str,
        category: Option<Category>,
        limit: usize,
        purpose: &str,
    ) -> Vec<Event> {
        match self.feed.list_events(city, category, limit).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("Failed to fetch feed events for {}: {}", purpose, e);
                Vec::new()
            }
        }
    }

    /// Local upcoming events, or none if the store fails.
    async fn local_or_empty(&self, filter: &EventFilter, from: chrono::DateTime<Utc>) -> Vec<Event> {
        match self.store.list_upcoming(filter, from).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("Failed to read local events: {:?}", e);
                Vec::new()
            }
        }
    }

    /// Fill in engagement counters for feed events that have a local copy.
    async fn enrich(&self, events: &mut [Event]) {
        if events.is_empty() {
            return;
        }
        let ids: Vec<EventId> = events.iter().map(|e| e.id).collect();
        match self.store.get_events_by_ids(&ids).await {
            Ok(stored) => apply_engagement(events, &stored),
            Err(e) => tracing::warn!("Skipping RSVP count enrichment: {:?}", e),
        }
    }

    /// Main listing: one page of today-and-later events from both sources,
    /// plus the upcoming carousel.
    pub async fn get_structured_events(
        &self,
        city: &str,
        category: Option<Category>,
        page: usize,
        page_size: usize,
    ) -> EventsPage {
        self.structured_events_in(city, category, page, page_size, DayWindow::local_today())
            .await
    }

    async fn structured_events_in(
        &self,
        city: &str,
        category: Option<Category>,
        page: usize,
        page_size: usize,
        window: DayWindow,
    ) -> EventsPage {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let local_filter = EventFilter {
            city: None,
            category,
            limit: LOCAL_FETCH_LIMIT,
            offset: 0,
        };

        let (mut carousel_feed, mut main_feed, local) = tokio::join!(
            self.feed_or_empty(city, None, CAROUSEL_FETCH_LIMIT, "carousel"),
            self.feed_or_empty(city, category, MAIN_FEED_FETCH_LIMIT, "main listing"),
            self.local_or_empty(&local_filter, window.today),
        );
        tracing::debug!(
            carousel = carousel_feed.len(),
            main = main_feed.len(),
            local = local.len(),
            "Fetched events from both sources"
        );

        tokio::join!(self.enrich(&mut main_feed), self.enrich(&mut carousel_feed));

        let mut current = starting_from(merge_with_local_precedence(main_feed, local), window.today);
        sort_soonest_first(&mut current);
        let total = current.len();
        let page_events = paginate(&current, page, page_size);
        tracing::debug!(
            "Page {}: returning {} of {} events",
            page,
            page_events.len(),
            total
        );

        EventsPage {
            current: page_events,
            upcoming: carousel(carousel_feed, &window, CAROUSEL_SIZE),
            total,
        }
    }

    /// Today's feed events across all categories, latest start first.
    pub async fn get_trending_events(&self, city: &str, limit: usize) -> Vec<Event> {
        self.trending_events_in(city, limit, DayWindow::local_today()).await
    }

    async fn trending_events_in(&self, city: &str, limit: usize, window: DayWindow) -> Vec<Event> {
        let mut events = self
            .feed_or_empty(city, None, TRENDING_FETCH_LIMIT, "trending")
            .await;
        self.enrich(&mut events).await;
        happening_today(events, &window, limit)
    }

    /// Flat list: events starting before tomorrow (latest first, one page)
    /// followed by the next 20 from tomorrow on (soonest first).
    pub async fn get_upcoming_events(
        &self,
        city: &str,
        category: Option<Category>,
        language: &str,
        page: usize,
        page_size: usize,
    ) -> Vec<Event> {
        self.upcoming_events_in(city, category, language, page, page_size, DayWindow::local_today())
            .await
    }

    async fn upcoming_events_in(
        &self,
        city: &str,
        category: Option<Category>,
        language: &str,
        page: usize,
        page_size: usize,
        window: DayWindow,
    ) -> Vec<Event> {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let offset = (page - 1).saturating_mul(page_size);
        let local_filter = EventFilter {
            city: None,
            category,
            limit: to_sql_bound((page_size / 4).max(1)),
            offset: to_sql_bound(offset / 4),
        };
        tracing::debug!(city, language, page, page_size, "Building upcoming events list");

        let (mut feed, local) = tokio::join!(
            self.feed_or_empty(
                city,
                category,
                page_size.saturating_mul(2).max(LEGACY_MIN_FEED_FETCH),
                "upcoming list"
            ),
            self.local_or_empty(&local_filter, Utc::now()),
        );
        self.enrich(&mut feed).await;

        let merged = merge_with_local_precedence(feed, local);
        let (mut current, upcoming) = split_current_upcoming(merged, &window, page_size, CAROUSEL_SIZE);
        current.extend(upcoming);
        current
    }

    /// The local copy of an event, or the feed's copy if it was never stored.
    /// Feed copies are not persisted here.
    pub async fn get_event(&self, id: EventId) -> Result<Event, ServiceError> {
        if let Some(event) = self.store.get_event(id).await? {
            return Ok(event);
        }
        self.feed.fetch_by_id(id).await.map_err(not_found_from_feed)
    }

    /// Make sure an event exists locally, copying it from the feed if needed.
    async fn ensure_local(&self, id: EventId) -> Result<Event, ServiceError> {
        if let Some(event) = self.store.get_event(id).await? {
            return Ok(event);
        }

        tracing::info!("Event {} not found locally, fetching from feed", id);
        let event = self.feed.fetch_by_id(id).await.map_err(not_found_from_feed)?;
        let stored = self.store.upsert_event(&event).await?;
        tracing::info!("Saved feed event {} to the local store", id);
        Ok(stored)
    }

    /// Record `user_id`'s RSVP, backfilling the event from the feed first if
    /// it only exists there.
    pub async fn upsert_rsvp(
        &self,
        event_id: EventId,
        user_id: UserId,
        status: &str,
    ) -> Result<Rsvp, ServiceError> {
        let status = RsvpStatus::from_str(status)
            .ok_or_else(|| ServiceError::InvalidStatus(status.to_string()))?;

        self.ensure_local(event_id).await?;
        let rsvp = self.store.upsert_rsvp(event_id, user_id, status).await?;
        tracing::info!("RSVP {} for event {} by user {}", status, event_id, user_id);
        Ok(rsvp)
    }

    pub async fn delete_rsvp(&self, event_id: EventId, user_id: UserId) -> Result<(), ServiceError> {
        if self.store.delete_rsvp(event_id, user_id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound("RSVP".to_string()))
        }
    }

    pub async fn get_user_rsvp(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<Option<Rsvp>, ServiceError> {
        Ok(self.store.get_rsvp(event_id, user_id).await?)
    }

    /// A user's RSVPs, optionally only those with `status` (empty means all).
    pub async fn get_user_rsvps(
        &self,
        user_id: UserId,
        status: Option<&str>,
    ) -> Result<Vec<Rsvp>, ServiceError> {
        let status = match status.filter(|s| !s.is_empty()) {
            Some(s) => Some(
                RsvpStatus::from_str(s).ok_or_else(|| ServiceError::InvalidStatus(s.to_string()))?,
            ),
            None => None,
        };
        Ok(self.store.list_user_rsvps(user_id, status).await?)
    }

    /// Attendees of a locally stored event.
    pub async fn get_event_attendees(&self, event_id: EventId) -> Result<EventAttendees, ServiceError> {
        if self.store.get_event(event_id).await?.is_none() {
            return Err(ServiceError::NotFound("Event".to_string()));
        }
        Ok(self.store.get_attendees(event_id).await?)
    }

    pub async fn create_event(
        &self,
        req: CreateEventRequest,
        user_id: UserId,
    ) -> Result<Event, ServiceError> {
        let category = validate_new_event(&req)?;
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            title: req.title.trim().to_string(),
            description: req.description,
            start_date: req.start_date,
            end_date: req.end_date,
            location: req.location,
            address: req.address,
            city: req.city,
            category,
            event_type: req.event_type,
            image_url: req.image_url,
            price: req.price,
            is_free: req.is_free,
            organizer_name: req.organizer_name,
            organizer_contact: req.organizer_contact,
            ticket_url: blank_to_none(req.ticket_url),
            max_capacity: req.max_capacity,
            going_count: 0,
            interested_count: 0,
            source: USER_SOURCE.to_string(),
            external_id: None,
            created_by: Some(user_id),
            created_at: now,
            updated_at: now,
            is_deleted: false,
        };

        let stored = self.store.upsert_event(&event).await?;
        tracing::info!("User {} created event {}", user_id, stored.id);
        Ok(stored)
    }

    /// Load a local event and check that `user_id` created it.
    async fn owned_event(&self, id: EventId, user_id: UserId, action: &str) -> Result<Event, ServiceError> {
        let event = self
            .store
            .get_event(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Event".to_string()))?;
        if !event.is_user_created() || event.created_by != Some(user_id) {
            return Err(ServiceError::Forbidden(format!(
                "You can only {} your own events",
                action
            )));
        }
        Ok(event)
    }

    pub async fn update_event(
        &self,
        id: EventId,
        req: UpdateEventRequest,
        user_id: UserId,
    ) -> Result<Event, ServiceError> {
        let mut event = self.owned_event(id, user_id, "update").await?;
        apply_update(&mut event, req)?;
        self.store
            .update_event(&event)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Event".to_string()))
    }

    pub async fn delete_event(&self, id: EventId, user_id: UserId) -> Result<(), ServiceError> {
        self.owned_event(id, user_id, "delete").await?;
        if self.store.soft_delete_event(id).await? {
            tracing::info!("User {} deleted event {}", user_id, id);
            Ok(())
        } else {
            Err(ServiceError::NotFound("Event".to_string()))
        }
    }

    pub async fn get_user_events(&self, user_id: UserId) -> Result<Vec<Event>, ServiceError> {
        Ok(self.store.list_user_events(user_id).await?)
    }
}

fn not_found_from_feed(err: FeedError) -> ServiceError {
    match err {
        FeedError::NotFound(_) => ServiceError::NotFound("Event".to_string()),
        other => other.into(),
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn validate_title(title: &str) -> Result<(), ServiceError> {
    let len = title.trim().chars().count();
    if !(3..=255).contains(&len) {
        return Err(ServiceError::Validation(
            "Title must be between 3 and 255 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), ServiceError> {
    let len = description.chars().count();
    if !(10..=5000).contains(&len) {
        return Err(ServiceError::Validation(
            "Description must be between 10 and 5000 characters".to_string(),
        ));
    }
    Ok(())
}

fn parse_category(value: &str) -> Result<Category, ServiceError> {
    Category::from_str(value)
        .ok_or_else(|| ServiceError::Validation(format!("Unknown category '{}'", value)))
}

fn validate_event_type(event_type: Option<&str>) -> Result<(), ServiceError> {
    match event_type {
        Some(t) if !EVENT_TYPES.contains(&t) => {
            Err(ServiceError::Validation(format!("Unknown event type '{}'", t)))
        }
        _ => Ok(()),
    }
}

fn validate_capacity(max_capacity: Option<i32>) -> Result<(), ServiceError> {
    match max_capacity {
        Some(c) if c < 1 => Err(ServiceError::Validation(
            "Max capacity must be at least 1".to_string(),
        )),
        _ => Ok(()),
    }
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// LIMIT/OFFSET values are bigint; anything larger is clamped.
fn to_sql_bound(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn validate_new_event(req: &CreateEventRequest) -> Result<Category, ServiceError> {
    validate_title(&req.title)?;
    validate_description(&req.description)?;
    require_non_empty(&req.location, "Location")?;
    require_non_empty(&req.city, "City")?;
    validate_event_type(req.event_type.as_deref())?;
    validate_capacity(req.max_capacity)?;
    parse_category(&req.category)
}

/// Apply the supplied fields of `req` to `event`, validating each.
fn apply_update(event: &mut Event, req: UpdateEventRequest) -> Result<(), ServiceError> {
    if let Some(title) = req.title {
        validate_title(&title)?;
        event.title = title.trim().to_string();
    }
    if let Some(description) = req.description {
        validate_description(&description)?;
        event.description = description;
    }
    if let Some(start_date) = req.start_date {
        event.start_date = start_date;
    }
    if req.end_date.is_some() {
        event.end_date = req.end_date;
    }
    if let Some(location) = req.location {
        require_non_empty(&location, "Location")?;
        event.location = location;
    }
    if req.address.is_some() {
        event.address = req.address;
    }
    if let Some(city) = req.city {
        require_non_empty(&city, "City")?;
        event.city = city;
    }
    if let Some(category) = req.category {
        event.category = parse_category(&category)?;
    }
    if req.event_type.is_some() {
        validate_event_type(req.event_type.as_deref())?;
        event.event_type = req.event_type;
    }
    if req.image_url.is_some() {
        event.image_url = req.image_url;
    }
    if req.price.is_some() {
        event.price = req.price;
    }
    if let Some(is_free) = req.is_free {
        event.is_free = is_free;
    }
    if req.organizer_name.is_some() {
        event.organizer_name = req.organizer_name;
    }
    if req.organizer_contact.is_some() {
        event.organizer_contact = req.organizer_contact;
    }
    if req.ticket_url.is_some() {
        event.ticket_url = blank_to_none(req.ticket_url);
    }
    if req.max_capacity.is_some() {
        validate_capacity(req.max_capacity)?;
        event.max_capacity = req.max_capacity;
    }
    Ok(())
}
