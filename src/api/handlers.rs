//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::{
    notify::TimerNotification,
    state::{HistoryEntry, StoreError, Timer, TimerDraft, TimerPatch, TimerUpdate},
};
use super::{
    responses::{ApiError, ApiResponse, CategoryActionResult, CategorySummary, HealthResponse},
    ApiState,
};

/// Control applied to one timer or to a whole category
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerAction {
    Start,
    Pause,
    Reset,
}

impl TimerAction {
    fn past_tense(self) -> &'static str {
        match self {
            TimerAction::Start => "started",
            TimerAction::Pause => "paused",
            TimerAction::Reset => "reset",
        }
    }
}

/// Split a command result into its value and a warning when only the save failed
fn settle<T>(result: Result<T, StoreError>) -> Result<(Option<T>, Option<String>), ApiError> {
    match result {
        Ok(value) => Ok((Some(value), None)),
        Err(e) if e.is_unsaved() => {
            warn!("Change applied but not saved: {}", e);
            Ok((None, Some(e.to_string())))
        }
        Err(e) => Err(e.into()),
    }
}

/// Handle GET /timers
pub async fn list_timers_handler(State(state): State<Arc<ApiState>>) -> Result<Json<ApiResponse<Vec<Timer>>>, ApiError> {
    let timers = state.store.timers()?;
    Ok(Json(ApiResponse::ok(format!("{} timers", timers.len()), timers)))
}

/// Handle POST /timers - validate a draft and add it paused
pub async fn create_timer_handler(
    State(state): State<Arc<ApiState>>,
    Json(draft): Json<TimerDraft>,
) -> Result<Json<ApiResponse<Timer>>, ApiError> {
    let timer = draft.validate()?;
    let message = format!("\"{}\" has been added successfully", timer.name);

    let (_, warning) = settle(state.store.add_timer(timer.clone()).await)?;
    info!("Timer {} created", timer.id);
    Ok(Json(ApiResponse::settled(message, warning, timer)))
}

/// Handle GET /timers/:id
pub async fn get_timer_handler(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Timer>>, ApiError> {
    let timer = state
        .store
        .timer(&id)?
        .ok_or_else(|| ApiError::NotFound(format!("timer {}", id)))?;
    Ok(Json(ApiResponse::ok(timer.name.clone(), timer)))
}

/// Handle PATCH /timers/:id - partial field update
pub async fn update_timer_handler(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(patch): Json<TimerPatch>,
) -> Result<Json<ApiResponse<Timer>>, ApiError> {
    let (found, warning) = settle(state.store.update_timer(&id, TimerUpdate::SetFields(patch)).await)?;
    respond_with_timer(&state, &id, found, warning, "updated")
}

/// Handle POST /timers/:id/:action - start, pause or reset one timer
pub async fn timer_action_handler(
    State(state): State<Arc<ApiState>>,
    Path((id, action)): Path<(String, TimerAction)>,
) -> Result<Json<ApiResponse<Timer>>, ApiError> {
    let result = match action {
        TimerAction::Start => state.store.start_timer(&id).await,
        TimerAction::Pause => state.store.pause_timer(&id).await,
        TimerAction::Reset => state.store.reset_timer(&id).await,
    };
    let (found, warning) = settle(result)?;
    respond_with_timer(&state, &id, found, warning, action.past_tense())
}

fn respond_with_timer(
    state: &ApiState,
    id: &str,
    found: Option<bool>,
    warning: Option<String>,
    verb: &str,
) -> Result<Json<ApiResponse<Timer>>, ApiError> {
    let not_found = || ApiError::NotFound(format!("timer {}", id));
    if found == Some(false) {
        return Err(not_found());
    }
    let timer = state.store.timer(id)?.ok_or_else(not_found)?;
    Ok(Json(ApiResponse::settled(format!("\"{}\" {}", timer.name, verb), warning, timer)))
}

/// Handle GET /categories
pub async fn categories_handler(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<ApiResponse<Vec<CategorySummary>>>, ApiError> {
    let timers = state.store.timers()?;
    let summaries: Vec<CategorySummary> = state
        .store
        .categories()?
        .into_iter()
        .map(|name| CategorySummary::collect(name, &timers))
        .collect();

    let message = if summaries.is_empty() {
        "No timers found".to_string()
    } else {
        format!("{} categories", summaries.len())
    };
    Ok(Json(ApiResponse::ok(message, summaries)))
}

/// Handle POST /categories/:category/:action - bulk start, pause or reset
pub async fn category_action_handler(
    State(state): State<Arc<ApiState>>,
    Path((category, action)): Path<(String, TimerAction)>,
) -> Result<Json<ApiResponse<CategoryActionResult>>, ApiError> {
    let result = match action {
        TimerAction::Start => state.store.start_all_in_category(&category).await,
        TimerAction::Pause => state.store.pause_all_in_category(&category).await,
        TimerAction::Reset => state.store.reset_all_in_category(&category).await,
    };
    let (affected, warning) = settle(result)?;

    let message = match affected {
        Some(n) => format!("{} timers {} in '{}'", n, action.past_tense(), category),
        None => format!("Timers {} in '{}'", action.past_tense(), category),
    };
    let timers = state.store.timers_in_category(&category)?;
    Ok(Json(ApiResponse::settled(
        message,
        warning,
        CategoryActionResult {
            category,
            affected,
            timers,
        },
    )))
}

/// Handle GET /history
pub async fn history_handler(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<ApiResponse<Vec<HistoryEntry>>>, ApiError> {
    let history = state.store.history()?;
    let message = if history.is_empty() {
        "No timer history yet".to_string()
    } else {
        format!("{} completed timers", history.len())
    };
    Ok(Json(ApiResponse::ok(message, history)))
}

/// Handle GET /completions - completed timers awaiting acknowledgment
pub async fn completions_handler(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let pending = state.store.pending_completions()?;
    let message = match pending.len() {
        0 => "Nothing to acknowledge".to_string(),
        1 => format!("Timer \"{}\" has completed", pending[0]),
        _ => format!("Timers \"{}\" have completed", pending.join(", ")),
    };
    Ok(Json(ApiResponse::ok(message, pending)))
}

/// Handle POST /completions/ack
pub async fn acknowledge_handler(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let acknowledged = state.store.acknowledge_completions()?;
    Ok(Json(ApiResponse::ok(
        format!("Acknowledged {} completions", acknowledged.len()),
        acknowledged,
    )))
}

/// Handle GET /events - server-sent stream of halfway and completion notifications
pub async fn events_handler(
    State(state): State<Arc<ApiState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let rx = state.notifications.subscribe();

    let stream = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(notification) => {
                    let kind = match &notification {
                        TimerNotification::Halfway { .. } => "halfway",
                        TimerNotification::Completions { .. } => "completions",
                    };
                    let event = Event::default().event(kind).json_data(&notification);
                    return Some((event, rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream subscriber skipped {} notifications", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
