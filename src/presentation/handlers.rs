// HTTP request handlers
use crate::application::dashboard_service::{Command, DashboardClosed};
use crate::domain::dashboard::DashboardSnapshot;
use crate::domain::query::{DateRange, SortConfig};
use crate::domain::record::RecordField;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::stream::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;

#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    #[serde(flatten)]
    pub filter: DateRange,
    /// Keeps the current sort when omitted
    #[serde(default)]
    pub sort: Option<SortConfig>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardSnapshot> {
    Json(state.dashboard.snapshot())
}

/// Push every new snapshot to the client as a `snapshot` event
pub async fn dashboard_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let snapshots = WatchStream::new(state.dashboard.subscribe()).filter_map(|snapshot| {
        match Event::default().event("snapshot").json_data(&snapshot) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                tracing::error!("Failed to encode snapshot: {}", e);
                None
            }
        }
    });
    Sse::new(snapshots).keep_alive(KeepAlive::default())
}

pub async fn request_sort(
    Path(key): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let key = match key.parse::<RecordField>() {
        Ok(key) => key,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    accepted(state.dashboard.request_sort(key).await)
}

pub async fn apply_filter(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FilterRequest>,
) -> Response {
    let command = Command::Configure {
        filter: request.filter,
        sort: request.sort,
    };
    accepted(state.dashboard.send(command).await)
}

pub async fn refresh(State(state): State<Arc<AppState>>) -> Response {
    accepted(state.dashboard.reload().await)
}

pub async fn reacquire_location(State(state): State<Arc<AppState>>) -> Response {
    accepted(state.dashboard.reacquire_location().await)
}

fn accepted(result: Result<(), DashboardClosed>) -> Response {
    match result {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            tracing::error!("Dropping request: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
    }
}
