//! HTTP API module
//!
//! Thin adapter over the timer store's command surface.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{notify::ChannelSink, state::TimerStore};
use handlers::*;

/// Shared state handed to every handler
pub struct ApiState {
    pub store: Arc<TimerStore>,
    /// Source of the `/events` stream; must be the sink the store notifies
    pub notifications: ChannelSink,
}

/// Create the HTTP router with all endpoints
pub fn create_router(store: Arc<TimerStore>, notifications: ChannelSink) -> Router {
    let state = Arc::new(ApiState { store, notifications });

    Router::new()
        .route("/timers", get(list_timers_handler).post(create_timer_handler))
        .route("/timers/:id", get(get_timer_handler).patch(update_timer_handler))
        .route("/timers/:id/:action", post(timer_action_handler))
        .route("/categories", get(categories_handler))
        .route("/categories/:category/:action", post(category_action_handler))
        .route("/history", get(history_handler))
        .route("/completions", get(completions_handler))
        .route("/completions/ack", post(acknowledge_handler))
        .route("/events", get(events_handler))
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
