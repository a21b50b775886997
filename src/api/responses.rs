//! API response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{StoreError, Timer, TimerStatus, ValidationError};

/// Envelope for every successful API call.
///
/// `status` is `"unsaved"` when the change took effect but could not be
/// written to storage; `warning` then says why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(status: &str, message: String, warning: Option<String>, data: T) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            warning,
            data,
        }
    }

    pub fn ok(message: String, data: T) -> Self {
        Self::new("ok", message, None, data)
    }

    /// `ok`, or `unsaved` carrying the warning
    pub fn settled(message: String, warning: Option<String>, data: T) -> Self {
        match warning {
            Some(_) => Self::new("unsaved", message, warning, data),
            None => Self::ok(message, data),
        }
    }
}

/// Per-category counts for grouping timers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub name: String,
    pub total: usize,
    pub running: usize,
    pub paused: usize,
    pub completed: usize,
}

impl CategorySummary {
    pub fn collect(name: String, timers: &[Timer]) -> Self {
        let in_category: Vec<&Timer> = timers.iter().filter(|t| t.category == name).collect();
        let count = |status: TimerStatus| in_category.iter().filter(|t| t.status == status).count();

        Self {
            total: in_category.len(),
            running: count(TimerStatus::Running),
            paused: count(TimerStatus::Paused),
            completed: count(TimerStatus::Completed),
            name,
        }
    }
}

/// Result of a bulk category command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryActionResult {
    pub category: String,
    /// Unknown when the save failed
    pub affected: Option<usize>,
    pub timers: Vec<Timer>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error body returned for rejected requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Request failures and the status codes they map to
#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    NotFound(String),
    Internal(String),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Validation(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, message) = match self {
            ApiError::Validation(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        let body = ErrorResponse {
            status: "error".to_string(),
            message,
            timestamp: Utc::now(),
        };
        (code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_by_status() {
        let mut running = Timer::new("a", "Work", 5, false);
        running.start();
        let timers = vec![running, Timer::new("b", "Work", 5, false), Timer::new("c", "Home", 5, false)];

        let summary = CategorySummary::collect("Work".to_string(), &timers);
        assert_eq!(
            summary,
            CategorySummary {
                name: "Work".to_string(),
                total: 2,
                running: 1,
                paused: 1,
                completed: 0,
            }
        );
    }

    #[test]
    fn settled_marks_unsaved() {
        assert_eq!(ApiResponse::settled("x".into(), None, ()).status, "ok");
        let unsaved = ApiResponse::settled("x".into(), Some("disk full".into()), ());
        assert_eq!(unsaved.status, "unsaved");
        assert_eq!(unsaved.warning.as_deref(), Some("disk full"));
    }
}
