//! OpenAgenda feed adapter.
//!
//! The feed has no lookup by our identifiers, so [`EventFeed::fetch_by_id`] scans
//! a bounded window of the most relevant events and matches on the stable id.

use axum::async_trait;
use chrono::{DateTime, Duration, Local, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::config::OpenAgendaConfig;
use crate::error::{FeedError, SkipReason};
use crate::models::{Category, Event, EventId};
use crate::services::classifier::classify;
use crate::services::identity::{external_key, stable_id};
use crate::services::sources::EventFeed;
use crate::utils::date::format_day;
use crate::utils::text::{
    sanitize, truncate_chars, MAX_CITY_CHARS, MAX_LOCATION_CHARS, MAX_TITLE_CHARS,
};

/// Provenance tag and identity namespace for events from this feed.
pub const SOURCE_NAME: &str = "openagenda";

/// How many events `fetch_by_id` scans before giving up.
pub const BACKFILL_SCAN_WINDOW: usize = 300;

const UNTITLED: &str = "Untitled Event";
const UNKNOWN_CITY: &str = "Unknown";

#[derive(Debug, Clone)]
pub struct OpenAgendaClient {
    client: Client,
    base_url: String,
    agenda_uid: String,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedResponse {
    #[serde(default)]
    pub events: Option<Vec<FeedRecord>>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// One raw event as the feed sends it. Every field is optional on the wire.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedRecord {
    pub uid: Option<u64>,
    pub title: Option<LocalizedText>,
    pub description: Option<LocalizedText>,
    pub image: Option<FeedImage>,
    pub location: Option<FeedLocation>,
    pub first_timing: Option<FeedTiming>,
    pub last_timing: Option<FeedTiming>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LocalizedText {
    pub fr: Option<String>,
    pub en: Option<String>,
}

impl LocalizedText {
    /// French first, then English. Empty strings count as missing.
    fn preferred(&self) -> Option<&str> {
        [self.fr.as_deref(), self.en.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
    }

    /// Both locales, for keyword matching.
    fn joined(&self) -> String {
        format!(
            "{} {}",
            self.fr.as_deref().unwrap_or_default(),
            self.en.as_deref().unwrap_or_default()
        )
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FeedImage {
    pub base: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FeedLocation {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FeedTiming {
    pub begin: Option<String>,
    pub end: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl OpenAgendaClient {
    pub fn new(config: &OpenAgendaConfig, timeout: std::time::Duration) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Unavailable(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            agenda_uid: config.agenda_uid.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.agenda_uid.is_empty()
    }

    fn events_url(&self) -> String {
        format!("{}/agendas/{}/events", self.base_url, self.agenda_uid)
    }

    async fn fetch_records(&self, limit: usize) -> Result<Vec<FeedRecord>, FeedError> {
        let query = list_query(limit, &format_day(&Local::now()), self.api_key.as_deref());

        let response = self
            .client
            .get(self.events_url())
            .query(&query)
            .send()
            .await
            .map_err(|e| FeedError::Unavailable(format!("request to OpenAgenda failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Unavailable(format!("failed to read OpenAgenda response: {}", e)))?;

        if !status.is_success() {
            tracing::warn!("OpenAgenda API error (status {}): {}", status, body);
            return Err(FeedError::Unavailable(format!(
                "OpenAgenda API error (status {})",
                status
            )));
        }

        let parsed: FeedResponse =
            serde_json::from_str(&body).map_err(|e| FeedError::Decode(e.to_string()))?;
        let records = parsed.events.unwrap_or_default();
        tracing::debug!(
            received = records.len(),
            total = ?parsed.total,
            "Received events from OpenAgenda"
        );
        Ok(records)
    }
}

/// Query string for the list endpoint, in wire order.
pub fn list_query(limit: usize, today: &str, api_key: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("size", limit.to_string()),
        ("sort", "timings.begin.asc".to_string()),
        ("relative[]", "current".to_string()),
        ("relative[]", "upcoming".to_string()),
        ("timings[gte]", today.to_string()),
    ];
    if let Some(key) = api_key.filter(|k| !k.is_empty()) {
        query.push(("key", key.to_string()));
    }
    query
}

/// Normalize one feed record, or say why it has to be left out.
pub fn convert_record(record: &FeedRecord, now: DateTime<Utc>) -> Result<Event, SkipReason> {
    let uid = record.uid.ok_or(SkipReason::MissingUid)?;

    let begin = record
        .first_timing
        .as_ref()
        .and_then(|t| non_empty(&t.begin))
        .ok_or(SkipReason::MissingStart)?;
    let start_date = DateTime::parse_from_rfc3339(begin)
        .map_err(|_| SkipReason::InvalidStart(begin.to_string()))?
        .with_timezone(&Utc);

    if start_date < now - Duration::hours(24) {
        return Err(SkipReason::Past);
    }

    let end_date = record
        .last_timing
        .as_ref()
        .and_then(|t| non_empty(&t.end))
        .filter(|end| *end != begin)
        .and_then(|end| DateTime::parse_from_rfc3339(end).ok())
        .map(|end| end.with_timezone(&Utc));

    let title_text = record.title.clone().unwrap_or_default();
    let description_text = record.description.clone().unwrap_or_default();

    let mut title = title_text.preferred().unwrap_or(UNTITLED).to_string();
    truncate_chars(&mut title, MAX_TITLE_CHARS);
    let description = sanitize(description_text.preferred().unwrap_or_default());
    let category = classify(&title_text.joined(), &description_text.joined());

    let image_url = record.image.as_ref().and_then(|image| {
        match (non_empty(&image.base), non_empty(&image.filename)) {
            (Some(base), Some(filename)) => Some(format!("{}{}", base, filename)),
            _ => None,
        }
    });

    let location = record.location.clone().unwrap_or_default();
    let mut city = non_empty(&location.city).unwrap_or(UNKNOWN_CITY).to_string();
    truncate_chars(&mut city, MAX_CITY_CHARS);
    let mut location_name = non_empty(&location.name)
        .or(non_empty(&location.city))
        .unwrap_or_default()
        .to_string();
    truncate_chars(&mut location_name, MAX_LOCATION_CHARS);

    let uid = uid.to_string();
    Ok(Event {
        id: stable_id(SOURCE_NAME, &uid),
        title,
        description,
        start_date,
        end_date,
        location: location_name,
        address: non_empty(&location.address).map(str::to_string),
        city,
        category,
        event_type: None,
        image_url,
        price: None,
        is_free: true,
        organizer_name: None,
        organizer_contact: None,
        ticket_url: None,
        max_capacity: None,
        going_count: 0,
        interested_count: 0,
        source: SOURCE_NAME.to_string(),
        external_id: Some(external_key(SOURCE_NAME, &uid)),
        created_by: None,
        created_at: now,
        updated_at: now,
        is_deleted: false,
    })
}

/// Convert a batch, dropping records that can't be used or don't match `category`.
pub fn convert_records(
    records: &[FeedRecord],
    category: Option<Category>,
    now: DateTime<Utc>,
) -> Vec<Event> {
    records
        .iter()
        .filter_map(|record| match convert_record(record, now) {
            Ok(event) => Some(event),
            Err(reason) => {
                tracing::debug!(uid = ?record.uid, "Skipped feed record: {}", reason);
                None
            }
        })
        .filter(|event| category.map_or(true, |c| event.category == c))
        .collect()
}

#[async_trait]
impl EventFeed for OpenAgendaClient {
    async fn list_events(
        &self,
        city: &str,
        category: Option<Category>,
        limit: usize,
    ) -> Result<Vec<Event>, FeedError> {
        // The agenda itself is scoped to one area; `city` is informational here.
        tracing::info!(
            city,
            category = ?category,
            limit,
            "Fetching OpenAgenda events"
        );

        if !self.is_configured() {
            tracing::info!("No OpenAgenda agenda configured, returning no feed events");
            return Ok(Vec::new());
        }

        let records = self.fetch_records(limit).await?;
        let events = convert_records(&records, category, Utc::now());
        tracing::info!(
            "Returning {} of {} OpenAgenda events after filtering",
            events.len(),
            records.len()
        );
        Ok(events)
    }

    async fn fetch_by_id(&self, id: EventId) -> Result<Event, FeedError> {
        tracing::info!("Looking up event {} in OpenAgenda", id);

        if !self.is_configured() {
            return Err(FeedError::Unavailable("no OpenAgenda agenda configured".to_string()));
        }

        let events = self.list_events("", None, BACKFILL_SCAN_WINDOW).await?;
        events
            .into_iter()
            .find(|event| event.id == id)
            .ok_or(FeedError::NotFound(id))
    }
}
