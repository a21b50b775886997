//! Countdown Keeper - a persistent engine for many named countdown timers
//!
//! Timers are grouped by free-text category, advanced together by a single
//! one-second tick, saved after every change, and announce their halfway
//! point and completion to an injected event sink. Completed runs are kept in
//! an append-only history.

pub mod api;
pub mod config;
pub mod notify;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use notify::{ChannelSink, EventSink, TimerNotification, TracingSink};
pub use state::{HistoryEntry, Timer, TimerDraft, TimerStatus, TimerStore, TimerUpdate};
pub use storage::{FileKeyValueStore, JsonGateway, MemoryKeyValueStore, PersistenceGateway};
pub use tasks::{spawn_tick_scheduler, SchedulerHandle};
pub use utils::signals::shutdown_signal;
