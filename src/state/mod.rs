//! State management module
//!
//! Timer records, the pure tick transition and the store that owns them.

pub mod error;
pub mod store;
pub mod timer;
pub mod transition;

// Re-export main types
pub use error::{StoreError, ValidationError};
pub use store::{TickReport, TimerPatch, TimerStore, TimerUpdate};
pub use timer::{HistoryEntry, Timer, TimerDraft, TimerStatus};
pub use transition::{advance, TickEvent, Transition};
