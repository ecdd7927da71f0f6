// Aggregation and RSVP scenarios run against in-memory sources.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use city_events_api::models::{Category, RsvpStatus, USER_SOURCE};
use city_events_api::services::EventService;
use city_events_api::ServiceError;

mod test_helpers;
use test_helpers::*;

/// Twelve feed events over the coming days and three local ones, one of
/// which is a backfilled copy of a feed event with RSVPs on it.
fn rouen_sources() -> (Arc<StaticFeed>, Arc<MemoryEventStore>, Uuid) {
    let now = Utc::now();
    let feed_events: Vec<_> = (1..=12)
        .map(|d| sample_event(&format!("Feed event {}", d), now + Duration::days(d), "openagenda"))
        .collect();
    let shared_id = feed_events[4].id;

    let mut backfilled = feed_events[4].clone();
    backfilled.going_count = 5;
    backfilled.interested_count = 2;
    let local = vec![
        backfilled,
        sample_event("Atelier poterie", now + Duration::hours(30), USER_SOURCE),
        sample_event("Vide-grenier", now + Duration::days(20), USER_SOURCE),
    ];

    (
        Arc::new(StaticFeed::with_events(feed_events)),
        Arc::new(MemoryEventStore::with_events(local)),
        shared_id,
    )
}

#[tokio::test]
async fn test_structured_events_merge_both_sources() {
    let (feed, store, shared_id) = rouen_sources();
    let service = EventService::new(feed, store);

    let page = service.get_structured_events("Rouen", None, 1, 100).await;

    assert_eq!(page.total, 14, "shared event must be counted once");
    assert_eq!(page.current.len(), 14);
    assert!(page
        .current
        .windows(2)
        .all(|w| w[0].start_date <= w[1].start_date));

    let shared = page.current.iter().find(|e| e.id == shared_id).unwrap();
    assert_eq!(shared.going_count, 5);
    assert_eq!(shared.interested_count, 2);

    assert_eq!(page.upcoming.len(), 12);
    let in_carousel = page.upcoming.iter().find(|e| e.id == shared_id).unwrap();
    assert_eq!(in_carousel.going_count, 5, "carousel is enriched too");
}

#[tokio::test]
async fn test_structured_events_pagination_keeps_total() {
    let (feed, store, _) = rouen_sources();
    let service = EventService::new(feed, store);

    let first = service.get_structured_events("Rouen", None, 1, 10).await;
    let second = service.get_structured_events("Rouen", None, 2, 10).await;
    let beyond = service.get_structured_events("Rouen", None, 3, 10).await;

    assert_eq!(first.current.len(), 10);
    assert_eq!(second.current.len(), 4);
    assert!(beyond.current.is_empty());
    assert_eq!((first.total, second.total, beyond.total), (14, 14, 14));
    assert!(first.current[9].start_date <= second.current[0].start_date);
}

#[tokio::test]
async fn test_structured_events_category_filter() {
    let now = Utc::now();
    let mut match_event = sample_event("Match du FC Rouen", now + Duration::days(2), "openagenda");
    match_event.category = Category::Sports;
    let other = sample_event("Exposition", now + Duration::days(3), "openagenda");
    let service = EventService::new(
        Arc::new(StaticFeed::with_events(vec![match_event.clone(), other])),
        Arc::new(MemoryEventStore::default()),
    );

    let page = service
        .get_structured_events("Rouen", Some(Category::Sports), 1, 100)
        .await;

    assert_eq!(page.total, 1);
    assert_eq!(page.current[0].id, match_event.id);
    assert_eq!(page.upcoming.len(), 2, "carousel ignores the category");
}

#[tokio::test]
async fn test_feed_outage_serves_local_events() {
    let now = Utc::now();
    let local = sample_event("Atelier poterie", now + Duration::days(1), USER_SOURCE);
    let service = EventService::new(
        Arc::new(StaticFeed::failing()),
        Arc::new(MemoryEventStore::with_events(vec![local.clone()])),
    );

    let page = service.get_structured_events("Rouen", None, 1, 100).await;
    assert_eq!(page.total, 1);
    assert_eq!(page.current[0].id, local.id);
    assert!(page.upcoming.is_empty());

    assert!(service.get_trending_events("Rouen", 10).await.is_empty());
}

#[tokio::test]
async fn test_rsvp_backfills_feed_event_exactly_once() {
    let (feed, store, _) = rouen_sources();
    let target = feed.events[0].clone();
    let service = EventService::new(feed.clone(), store.clone());
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

    assert!(store.stored(target.id).is_none());
    let before = store.event_count();

    let rsvp = service.upsert_rsvp(target.id, alice, "going").await.unwrap();
    assert_eq!(rsvp.status, RsvpStatus::Going);
    assert_eq!(feed.fetch_calls(), 1);
    assert_eq!(store.event_count(), before + 1);

    service
        .upsert_rsvp(target.id, bob, "interested")
        .await
        .unwrap();
    service
        .upsert_rsvp(target.id, alice, "interested")
        .await
        .unwrap();

    assert_eq!(feed.fetch_calls(), 1, "later RSVPs use the local copy");
    assert_eq!(store.event_count(), before + 1);
    let stored = store.stored(target.id).unwrap();
    assert_eq!(stored.source, "openagenda");
    assert_eq!((stored.going_count, stored.interested_count), (0, 2));

    let attendees = service.get_event_attendees(target.id).await.unwrap();
    assert_eq!(attendees.interested_count, 2);
    assert!(attendees.going.is_empty());
}

#[tokio::test]
async fn test_rsvp_with_invalid_status_changes_nothing() {
    let (feed, store, _) = rouen_sources();
    let target = feed.events[0].id;
    let service = EventService::new(feed.clone(), store.clone());
    let before = store.event_count();

    let err = service
        .upsert_rsvp(target, Uuid::new_v4(), "maybe")
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InvalidStatus(_)));
    assert_eq!(feed.fetch_calls(), 0);
    assert_eq!(store.event_count(), before);
}

#[tokio::test]
async fn test_rsvp_for_unknown_event_is_not_found() {
    let (feed, store, _) = rouen_sources();
    let service = EventService::new(feed, store.clone());
    let before = store.event_count();

    let err = service
        .upsert_rsvp(Uuid::new_v4(), Uuid::new_v4(), "going")
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(store.event_count(), before);
}

#[tokio::test]
async fn test_get_event_falls_back_to_feed_without_persisting() {
    let (feed, store, _) = rouen_sources();
    let target = feed.events[1].clone();
    let service = EventService::new(feed, store.clone());

    let event = service.get_event(target.id).await.unwrap();
    assert_eq!(event.id, target.id);
    assert!(store.stored(target.id).is_none());
}

#[tokio::test]
async fn test_cancelling_an_rsvp_updates_counts() {
    let (feed, store, shared_id) = rouen_sources();
    let service = EventService::new(feed, store.clone());
    let user = Uuid::new_v4();

    service.upsert_rsvp(shared_id, user, "going").await.unwrap();
    assert_eq!(store.stored(shared_id).unwrap().going_count, 1);

    service.delete_rsvp(shared_id, user).await.unwrap();
    assert_eq!(store.stored(shared_id).unwrap().going_count, 0);
    assert!(service.get_user_rsvp(shared_id, user).await.unwrap().is_none());
    assert!(matches!(
        service.delete_rsvp(shared_id, user).await,
        Err(ServiceError::NotFound(_))
    ));
}
