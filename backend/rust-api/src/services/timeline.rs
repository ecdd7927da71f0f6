//! Pure list operations behind the event listings: merge, enrich, window,
//! sort and paginate. Nothing here touches I/O or the clock.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{Event, EventId};
use crate::utils::date::DayWindow;

/// Merge feed and local events by identifier. Local copies replace feed copies
/// with the same id because they carry authoritative counters and user edits.
pub fn merge_with_local_precedence(feed: Vec<Event>, local: Vec<Event>) -> Vec<Event> {
    let mut by_id: HashMap<EventId, Event> = HashMap::with_capacity(feed.len() + local.len());
    for event in feed {
        by_id.insert(event.id, event);
    }
    for event in local {
        by_id.insert(event.id, event);
    }
    by_id.into_values().collect()
}

/// Drop later duplicates of the same identifier, keeping first occurrences in order.
pub fn dedup_by_id(events: Vec<Event>) -> Vec<Event> {
    let mut seen = std::collections::HashSet::with_capacity(events.len());
    events.into_iter().filter(|e| seen.insert(e.id)).collect()
}

/// Copy going/interested counts from locally stored copies onto feed events.
/// Events without a local copy keep their counts.
pub fn apply_engagement(events: &mut [Event], stored: &[Event]) {
    let counts: HashMap<EventId, (i32, i32)> = stored
        .iter()
        .map(|e| (e.id, (e.going_count, e.interested_count)))
        .collect();
    for event in events.iter_mut() {
        if let Some((going, interested)) = counts.get(&event.id) {
            event.going_count = *going;
            event.interested_count = *interested;
        }
    }
}

fn soonest_first(a: &Event, b: &Event) -> Ordering {
    a.start_date
        .cmp(&b.start_date)
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_soonest_first(events: &mut [Event]) {
    events.sort_by(soonest_first);
}

pub fn sort_latest_first(events: &mut [Event]) {
    events.sort_by(|a, b| soonest_first(b, a));
}

/// Events starting at or after `from`.
pub fn starting_from(events: Vec<Event>, from: DateTime<Utc>) -> Vec<Event> {
    events.into_iter().filter(|e| e.start_date >= from).collect()
}

/// Offset/limit window for 1-based `page`. Past the end is an empty page.
pub fn paginate(events: &[Event], page: usize, page_size: usize) -> Vec<Event> {
    let offset = page.saturating_sub(1).saturating_mul(page_size);
    events.iter().skip(offset).take(page_size).cloned().collect()
}

/// Carousel: distinct events starting strictly after today's midnight,
/// soonest first, at most `cap`.
pub fn carousel(events: Vec<Event>, window: &DayWindow, cap: usize) -> Vec<Event> {
    let mut upcoming: Vec<Event> = dedup_by_id(events)
        .into_iter()
        .filter(|e| e.start_date > window.today)
        .collect();
    sort_soonest_first(&mut upcoming);
    upcoming.truncate(cap);
    upcoming
}

/// Events starting today, latest start first, at most `limit`.
pub fn happening_today(events: Vec<Event>, window: &DayWindow, limit: usize) -> Vec<Event> {
    let mut today: Vec<Event> = events
        .into_iter()
        .filter(|e| window.contains(e.start_date))
        .collect();
    sort_latest_first(&mut today);
    today.truncate(limit);
    today
}

/// Split into events starting before tomorrow (latest first, at most
/// `current_cap`) and from tomorrow on (soonest first, at most `upcoming_cap`).
pub fn split_current_upcoming(
    events: Vec<Event>,
    window: &DayWindow,
    current_cap: usize,
    upcoming_cap: usize,
) -> (Vec<Event>, Vec<Event>) {
    let (mut current, mut upcoming): (Vec<Event>, Vec<Event>) = events
        .into_iter()
        .partition(|e| e.start_date < window.tomorrow);
    sort_latest_first(&mut current);
    sort_soonest_first(&mut upcoming);
    current.truncate(current_cap);
    upcoming.truncate(upcoming_cap);
    (current, upcoming)
}
