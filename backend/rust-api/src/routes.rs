use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::middleware::auth_middleware;
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/v1/events", get(handlers::list_events))
        .route("/api/v1/events/trending", get(handlers::trending_events))
        .route("/api/v1/events/upcoming", get(handlers::upcoming_events))
        .route("/api/v1/events/:id", get(handlers::get_event))
        .route("/api/v1/events/:id/attendees", get(handlers::event_attendees));

    let protected = Router::new()
        .route("/api/v1/events", post(handlers::create_event))
        .route("/api/v1/events/my-events", get(handlers::my_events))
        .route("/api/v1/events/my-rsvps", get(handlers::my_rsvps))
        .route(
            "/api/v1/events/:id",
            put(handlers::update_event).delete(handlers::delete_event),
        )
        .route(
            "/api/v1/events/:id/rsvp",
            post(handlers::upsert_rsvp)
                .get(handlers::get_rsvp)
                .delete(handlers::delete_rsvp),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .merge(public)
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
