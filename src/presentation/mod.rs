// Presentation layer - HTTP surface over the dashboard state
pub mod app_state;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    apply_filter, dashboard_events, get_dashboard, health_check, reacquire_location, refresh,
    request_sort,
};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/events", get(dashboard_events))
        .route("/dashboard/sort/:key", post(request_sort))
        .route("/dashboard/filter", post(apply_filter))
        .route("/dashboard/refresh", post(refresh))
        .route("/dashboard/location", post(reacquire_location))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
