use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;

use crate::error::ServiceError;
use crate::middleware::AuthUser;
use crate::models::{ids::parse_uuid, Rsvp};
use crate::utils::response::ApiResponse;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RsvpRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct RsvpListQuery {
    pub status: Option<String>,
}

pub async fn upsert_rsvp(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<RsvpRequest>,
) -> Result<Json<ApiResponse<Rsvp>>, ServiceError> {
    let event_id = parse_uuid(&id, "event ID")?;
    let rsvp = state
        .events
        .upsert_rsvp(event_id, auth_user.user_id, &payload.status)
        .await?;
    Ok(Json(ApiResponse::ok("RSVP saved successfully", rsvp)))
}

pub async fn get_rsvp(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Option<Rsvp>>>, ServiceError> {
    let event_id = parse_uuid(&id, "event ID")?;
    let rsvp = state.events.get_user_rsvp(event_id, auth_user.user_id).await?;
    let message = if rsvp.is_some() {
        "RSVP retrieved successfully"
    } else {
        "No RSVP found"
    };
    Ok(Json(ApiResponse::ok(message, rsvp)))
}

pub async fn delete_rsvp(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    let event_id = parse_uuid(&id, "event ID")?;
    state.events.delete_rsvp(event_id, auth_user.user_id).await?;
    Ok(Json(ApiResponse::ok("RSVP deleted successfully", ())))
}

pub async fn my_rsvps(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<RsvpListQuery>,
) -> Result<Json<ApiResponse<Vec<Rsvp>>>, ServiceError> {
    let rsvps = state
        .events
        .get_user_rsvps(auth_user.user_id, params.status.as_deref())
        .await?;
    Ok(Json(ApiResponse::ok("Your RSVPs retrieved successfully", rsvps)))
}
