//! Broadcast fan-out of timer notifications

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::{EventSink, TimerNotification};

/// Publishes every notification on a broadcast channel.
///
/// Subscribers that fall behind lose the oldest notifications; nothing here
/// waits on a slow subscriber.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: broadcast::Sender<TimerNotification>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerNotification> {
        self.tx.subscribe()
    }

    fn publish(&self, notification: TimerNotification) {
        // No receivers is the normal state when no client is listening
        if let Err(e) = self.tx.send(notification) {
            debug!("No subscribers for notification: {:?}", e.0);
        }
    }
}

impl Default for ChannelSink {
    fn default() -> Self {
        Self::new(100)
    }
}

impl EventSink for ChannelSink {
    fn halfway(&self, timer_name: &str) {
        info!("Timer '{}' is halfway done", timer_name);
        self.publish(TimerNotification::Halfway {
            name: timer_name.to_string(),
            at: Utc::now(),
        });
    }

    fn completions(&self, pending: &[String]) {
        info!("Completed timers awaiting acknowledgment: {:?}", pending);
        self.publish(TimerNotification::Completions {
            names: pending.to_vec(),
            at: Utc::now(),
        });
    }
}
