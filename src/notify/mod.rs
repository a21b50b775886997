//! Notifications handed from the tick to the presentation layer

pub mod channel;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

pub use channel::ChannelSink;

/// Receiver of timer notifications.
///
/// Called after the store has released its lock, so implementations may read
/// the store but should return quickly.
pub trait EventSink: Send + Sync {
    /// A timer with the halfway alert enabled reached its halfway point
    fn halfway(&self, timer_name: &str);

    /// New completions arrived. `pending` is the whole unacknowledged queue,
    /// oldest first.
    fn completions(&self, pending: &[String]);
}

/// A notification as delivered to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerNotification {
    Halfway { name: String, at: DateTime<Utc> },
    Completions { names: Vec<String>, at: DateTime<Utc> },
}

impl TimerNotification {
    /// Human readable text, e.g. for a toast
    pub fn message(&self) -> String {
        match self {
            TimerNotification::Halfway { name, .. } => format!("\"{}\" is halfway done!", name),
            TimerNotification::Completions { names, .. } if names.len() == 1 => {
                format!("Timer \"{}\" has completed.", names[0])
            }
            TimerNotification::Completions { names, .. } => {
                format!("Timers \"{}\" have completed.", names.join(", "))
            }
        }
    }
}

/// Sink that only writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn halfway(&self, timer_name: &str) {
        info!("Timer '{}' is halfway done", timer_name);
    }

    fn completions(&self, pending: &[String]) {
        info!("Completed timers awaiting acknowledgment: {:?}", pending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_message_pluralises() {
        let one = TimerNotification::Completions { names: vec!["Tea".into()], at: Utc::now() };
        assert_eq!(one.message(), "Timer \"Tea\" has completed.");

        let two = TimerNotification::Completions {
            names: vec!["Tea".into(), "Eggs".into()],
            at: Utc::now(),
        };
        assert_eq!(two.message(), "Timers \"Tea, Eggs\" have completed.");
    }

    #[test]
    fn serialises_with_type_tag() {
        let note = TimerNotification::Halfway { name: "Tea".into(), at: Utc::now() };
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["type"], "halfway");
        assert_eq!(json["name"], "Tea");
    }
}
