//! Pure per-tick state transition
//!
//! `advance` computes the next state of one timer for one tick and the events
//! that tick produced. It touches no shared state, so the store can map it over
//! a snapshot of the whole collection and dispatch the events afterwards.

use super::timer::{Timer, TimerStatus};

/// Seconds removed from a running timer on every tick
pub const TICK_STEP_SECONDS: u32 = 1;

/// Something a tick detected about a single timer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickEvent {
    /// Remaining time crossed `floor(duration / 2)` on this tick
    Halfway { id: String, name: String },
    /// Remaining time reached zero on this tick
    Completed { id: String, name: String },
}

/// Result of advancing one timer by one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub timer: Timer,
    pub events: Vec<TickEvent>,
}

/// Advance a timer by one tick.
///
/// Only running timers with time left change. The halfway check is a threshold
/// crossing (`before > half >= after`): with unit steps it fires exactly on the
/// tick that lands on the halfway value, and it can never fire twice in one run
/// or after the point has already been passed.
pub fn advance(timer: &Timer) -> Transition {
    if timer.status != TimerStatus::Running || timer.remaining == 0 {
        return Transition {
            timer: timer.clone(),
            events: Vec::new(),
        };
    }

    let before = timer.remaining;
    let after = before.saturating_sub(TICK_STEP_SECONDS);
    let half = timer.halfway_point();

    let mut next = timer.clone();
    next.remaining = after;

    let mut events = Vec::new();
    if timer.halfway_alert && before > half && after <= half {
        events.push(TickEvent::Halfway {
            id: timer.id.clone(),
            name: timer.name.clone(),
        });
    }
    if after == 0 {
        next.status = TimerStatus::Completed;
        events.push(TickEvent::Completed {
            id: timer.id.clone(),
            name: timer.name.clone(),
        });
    }

    Transition { timer: next, events }
}
