//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, warn};

use crate::state::{AppState, Stopwatch, StopwatchId, StopwatchView};
use super::responses::{ActionResponse, HealthResponse, StatusResponse};

type ActionResult = Result<(StatusCode, Json<ActionResponse>), StatusCode>;

/// A user intent forwarded to a stopwatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Start,
    Stop,
    Lap,
    Reset,
}

impl Action {
    fn name(self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Lap => "lap",
            Action::Reset => "reset",
        }
    }

    fn apply(self, stopwatch: &Arc<Stopwatch>) -> Result<bool, String> {
        match self {
            Action::Start => stopwatch.start(),
            Action::Stop => stopwatch.stop(),
            Action::Lap => stopwatch.lap().map(|lap| lap.is_some()),
            Action::Reset => stopwatch.reset(),
        }
    }
}

fn find_stopwatch(state: &AppState, id: StopwatchId) -> Result<Arc<Stopwatch>, StatusCode> {
    state.stopwatch(id).ok_or_else(|| {
        warn!("Unknown stopwatch {} requested", id);
        StatusCode::NOT_FOUND
    })
}

fn render(stopwatch: &Stopwatch) -> Result<StopwatchView, StatusCode> {
    stopwatch.view().map_err(|e| {
        error!("Failed to render stopwatch {}: {}", stopwatch.id(), e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Apply an action and report whether it took effect
fn apply_action(state: &AppState, id: StopwatchId, action: Action) -> ActionResult {
    let stopwatch = find_stopwatch(state, id)?;

    let applied = action.apply(&stopwatch).map_err(|e| {
        error!("Failed to {} stopwatch {}: {}", action.name(), id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let view = render(&stopwatch)?;

    if applied {
        state.record_action(action.name(), id);
        Ok((
            StatusCode::OK,
            Json(ActionResponse::applied(format!("Stopwatch {} {}", id, action.name()), view)),
        ))
    } else {
        debug!("Ignored {} on stopwatch {} in phase {:?}", action.name(), id, view.phase);
        Ok((
            StatusCode::CONFLICT,
            Json(ActionResponse::ignored(
                format!("Cannot {} stopwatch {} while {:?}", action.name(), id, view.phase),
                view,
            )),
        ))
    }
}

/// Handle POST /stopwatches/:id/start
pub async fn start_handler(State(state): State<Arc<AppState>>, Path(id): Path<StopwatchId>) -> ActionResult {
    apply_action(&state, id, Action::Start)
}

/// Handle POST /stopwatches/:id/stop
pub async fn stop_handler(State(state): State<Arc<AppState>>, Path(id): Path<StopwatchId>) -> ActionResult {
    apply_action(&state, id, Action::Stop)
}

/// Handle POST /stopwatches/:id/lap
pub async fn lap_handler(State(state): State<Arc<AppState>>, Path(id): Path<StopwatchId>) -> ActionResult {
    apply_action(&state, id, Action::Lap)
}

/// Handle POST /stopwatches/:id/reset
pub async fn reset_handler(State(state): State<Arc<AppState>>, Path(id): Path<StopwatchId>) -> ActionResult {
    apply_action(&state, id, Action::Reset)
}

/// Handle GET /stopwatches - Render every stopwatch
pub async fn list_handler(State(state): State<Arc<AppState>>) -> Result<Json<Vec<StopwatchView>>, StatusCode> {
    state.views().map(Json).map_err(|e| {
        error!("Failed to render stopwatches: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Handle GET /stopwatches/:id - Render one stopwatch
pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<StopwatchId>,
) -> Result<Json<StopwatchView>, StatusCode> {
    let stopwatch = find_stopwatch(&state, id)?;
    render(&stopwatch).map(Json)
}

/// Handle GET /stopwatches/:id/events - Stream a fresh view after every change
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<StopwatchId>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, StatusCode> {
    let stopwatch = find_stopwatch(&state, id)?;
    let rx = stopwatch.subscribe();
    debug!("Client subscribed to stopwatch {} events", id);

    let events = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(change) => {
                    let view = StopwatchView::from_snapshot(change.id, &change.snapshot);
                    let event = Event::default()
                        .event(format!("{:?}", change.kind).to_lowercase())
                        .json_data(view);
                    return Some((event, rx));
                }
                // only the latest state matters for display
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Event subscriber lagged, skipped {} changes", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Handle GET /status - Return board status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let running = match state.running_count() {
        Ok(running) => running,
        Err(e) => {
            error!("Failed to count running stopwatches: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        stopwatches: state.stopwatches.len(),
        running,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
