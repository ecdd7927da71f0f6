use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::middleware::AuthUser;
use crate::models::{
    ids::parse_uuid, Category, CreateEventRequest, Event, EventAttendees, EventsPage,
    UpdateEventRequest,
};
use crate::utils::response::ApiResponse;
use crate::AppState;

const DEFAULT_PAGE_SIZE: usize = 100;
const DEFAULT_UPCOMING_PAGE_SIZE: usize = 20;
const DEFAULT_TRENDING_LIMIT: usize = 10;
const DEFAULT_LANGUAGE: &str = "fr";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsQuery {
    pub city: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    pub city: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct EventsListing {
    #[serde(flatten)]
    pub page: EventsPage,
    pub location: String,
    pub category: Option<Category>,
}

#[derive(Serialize)]
pub struct TrendingEvents {
    pub events: Vec<Event>,
    pub total: usize,
}

fn city_or_default(state: &AppState, city: Option<String>) -> String {
    city.map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| state.config.default_city.clone())
}

/// `None` for a missing, empty or `all` category.
fn category_filter(category: Option<&str>) -> Result<Option<Category>, ServiceError> {
    match category.map(str::trim) {
        None | Some("") => Ok(None),
        Some(c) if c.eq_ignore_ascii_case("all") => Ok(None),
        Some(c) => Category::from_str(c)
            .map(Some)
            .ok_or_else(|| ServiceError::Validation(format!("Unknown category '{}'", c))),
    }
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<EventsQuery>,
) -> Result<Json<ApiResponse<EventsListing>>, ServiceError> {
    let category = category_filter(params.category.as_deref())?;
    let city = city_or_default(&state, params.city);
    let page = params.page.unwrap_or(1);
    let page_size = params.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

    let events = state
        .events
        .get_structured_events(&city, category, page, page_size)
        .await;

    Ok(Json(ApiResponse::ok(
        "Events retrieved successfully",
        EventsListing {
            page: events,
            location: city,
            category,
        },
    )))
}

pub async fn trending_events(
    State(state): State<AppState>,
    Query(params): Query<TrendingQuery>,
) -> Json<ApiResponse<TrendingEvents>> {
    let city = city_or_default(&state, params.city);
    let limit = params.limit.unwrap_or(DEFAULT_TRENDING_LIMIT).max(1);
    let events = state.events.get_trending_events(&city, limit).await;

    Json(ApiResponse::ok(
        "Trending events retrieved successfully",
        TrendingEvents {
            total: events.len(),
            events,
        },
    ))
}

pub async fn upcoming_events(
    State(state): State<AppState>,
    Query(params): Query<EventsQuery>,
) -> Result<Json<ApiResponse<Vec<Event>>>, ServiceError> {
    let category = category_filter(params.category.as_deref())?;
    let city = city_or_default(&state, params.city);
    let language = params.language.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

    let events = state
        .events
        .get_upcoming_events(
            &city,
            category,
            &language,
            params.page.unwrap_or(1),
            params.page_size.unwrap_or(DEFAULT_UPCOMING_PAGE_SIZE),
        )
        .await;

    Ok(Json(ApiResponse::ok("Upcoming events retrieved successfully", events)))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Event>>, ServiceError> {
    let id = parse_uuid(&id, "event ID")?;
    let event = state.events.get_event(id).await?;
    Ok(Json(ApiResponse::ok("Event retrieved successfully", event)))
}

pub async fn event_attendees(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<EventAttendees>>, ServiceError> {
    let id = parse_uuid(&id, "event ID")?;
    let attendees = state.events.get_event_attendees(id).await?;
    Ok(Json(ApiResponse::ok("Attendees retrieved successfully", attendees)))
}

pub async fn create_event(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Event>>), ServiceError> {
    let event = state.events.create_event(payload, auth_user.user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Event created successfully", event)),
    ))
}

pub async fn update_event(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateEventRequest>,
) -> Result<Json<ApiResponse<Event>>, ServiceError> {
    let id = parse_uuid(&id, "event ID")?;
    let event = state
        .events
        .update_event(id, payload, auth_user.user_id)
        .await?;
    Ok(Json(ApiResponse::ok("Event updated successfully", event)))
}

pub async fn delete_event(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    let id = parse_uuid(&id, "event ID")?;
    state.events.delete_event(id, auth_user.user_id).await?;
    Ok(Json(ApiResponse::ok("Event deleted successfully", ())))
}

pub async fn my_events(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<Vec<Event>>>, ServiceError> {
    let events = state.events.get_user_events(auth_user.user_id).await?;
    Ok(Json(ApiResponse::ok("Your events retrieved successfully", events)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_filter_treats_all_and_blank_as_unfiltered() {
        assert_eq!(category_filter(None).unwrap(), None);
        assert_eq!(category_filter(Some("")).unwrap(), None);
        assert_eq!(category_filter(Some("All")).unwrap(), None);
        assert_eq!(category_filter(Some("Sports")).unwrap(), Some(Category::Sports));
    }

    #[test]
    fn category_filter_rejects_unknown_names() {
        assert!(matches!(
            category_filter(Some("opera")),
            Err(ServiceError::Validation(_))
        ));
    }
}
