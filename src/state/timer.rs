//! Timer and history records plus the per-timer state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValidationError;

/// Lifecycle status of a single countdown timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerStatus {
    Running,
    Paused,
    /// Terminal until an explicit reset
    Completed,
}

/// A named countdown timer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Total length in seconds, always greater than zero
    pub duration: u32,
    /// Seconds left, never above `duration`
    pub remaining: u32,
    pub status: TimerStatus,
    pub halfway_alert: bool,
}

impl Timer {
    /// Create a paused timer with a fresh id and a full countdown
    pub fn new(name: impl Into<String>, category: impl Into<String>, duration: u32, halfway_alert: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            category: category.into(),
            duration,
            remaining: duration,
            status: TimerStatus::Paused,
            halfway_alert,
        }
    }

    /// Remaining seconds at which the halfway alert fires
    pub fn halfway_point(&self) -> u32 {
        self.duration / 2
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn is_completed(&self) -> bool {
        self.status == TimerStatus::Completed
    }

    /// Start counting down. Completed timers stay completed.
    pub fn start(&mut self) -> bool {
        match self.status {
            TimerStatus::Paused => {
                self.status = TimerStatus::Running;
                true
            }
            TimerStatus::Running | TimerStatus::Completed => false,
        }
    }

    /// Pause a running timer. Anything else is left alone.
    pub fn pause(&mut self) -> bool {
        if self.status == TimerStatus::Running {
            self.status = TimerStatus::Paused;
            true
        } else {
            false
        }
    }

    /// Rewind to the full duration and pause, from any status
    pub fn reset(&mut self) {
        self.remaining = self.duration;
        self.status = TimerStatus::Paused;
    }

    /// Re-impose what an update may not change: the immutable fields, the
    /// countdown never rising except through a full reset, and only a tick
    /// moving a timer into `Completed`.
    pub(crate) fn reconcile_with(&mut self, original: &Timer) {
        self.id = original.id.clone();
        self.duration = original.duration;
        self.halfway_alert = original.halfway_alert;
        self.remaining = self.remaining.min(self.duration);

        let is_reset = self.remaining == self.duration && self.status == TimerStatus::Paused;
        if self.remaining > original.remaining && !is_reset {
            self.remaining = original.remaining;
        }

        let completing = self.remaining == 0 || self.status == TimerStatus::Completed;
        if completing && !original.is_completed() {
            self.remaining = original.remaining;
            self.status = original.status;
        }

        self.settle_status();
    }

    /// Repair a record read from storage. `None` when it cannot be a timer.
    pub(crate) fn repaired(mut self) -> Option<Timer> {
        if self.duration == 0 || self.id.is_empty() {
            return None;
        }
        self.remaining = self.remaining.min(self.duration);
        self.settle_status();
        Some(self)
    }

    fn settle_status(&mut self) {
        match (self.remaining, self.status) {
            (0, _) => self.status = TimerStatus::Completed,
            (_, TimerStatus::Completed) => self.remaining = 0,
            _ => {}
        }
    }
}

/// Snapshot of a timer taken at the moment it completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub name: String,
    /// Display string such as `"90 seconds"`
    pub duration: String,
    pub completed_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn completed(timer: &Timer, completed_at: DateTime<Utc>) -> Self {
        Self {
            name: timer.name.clone(),
            duration: format!("{} seconds", timer.duration),
            completed_at,
        }
    }
}

/// Unvalidated input for a new timer, as entered by a user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerDraft {
    pub name: String,
    pub category: String,
    pub duration: i64,
    #[serde(default)]
    pub halfway_alert: bool,
}

impl TimerDraft {
    /// Check the draft and turn it into a paused timer
    pub fn validate(self) -> Result<Timer, ValidationError> {
        let name = self.name.trim();
        let category = self.category.trim();
        if name.is_empty() || category.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        if self.duration <= 0 {
            return Err(ValidationError::NonPositiveDuration(self.duration));
        }
        let duration =
            u32::try_from(self.duration).map_err(|_| ValidationError::DurationTooLarge(self.duration))?;

        Ok(Timer::new(name, category, duration, self.halfway_alert))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, category: &str, duration: i64) -> TimerDraft {
        TimerDraft {
            name: name.to_string(),
            category: category.to_string(),
            duration,
            halfway_alert: false,
        }
    }

    #[test]
    fn new_timer_starts_paused_and_full() {
        let timer = Timer::new("Tea", "Kitchen", 180, true);
        assert_eq!(timer.remaining, 180);
        assert_eq!(timer.status, TimerStatus::Paused);
        assert!(!timer.id.is_empty());
        assert_ne!(timer.id, Timer::new("Tea", "Kitchen", 180, true).id);
    }

    #[test]
    fn start_refuses_completed_timer() {
        let mut timer = Timer::new("Tea", "Kitchen", 5, false);
        timer.remaining = 0;
        timer.status = TimerStatus::Completed;
        assert!(!timer.start());
        assert_eq!(timer.status, TimerStatus::Completed);
    }

    #[test]
    fn pause_only_from_running() {
        let mut timer = Timer::new("Tea", "Kitchen", 5, false);
        assert!(!timer.pause());
        timer.start();
        assert!(timer.pause());
        assert_eq!(timer.status, TimerStatus::Paused);
    }

    #[test]
    fn reset_escapes_completed() {
        let mut timer = Timer::new("Tea", "Kitchen", 5, false);
        timer.remaining = 0;
        timer.status = TimerStatus::Completed;
        timer.reset();
        assert_eq!(timer.remaining, 5);
        assert_eq!(timer.status, TimerStatus::Paused);
    }

    #[test]
    fn halfway_point_rounds_down() {
        assert_eq!(Timer::new("a", "b", 10, true).halfway_point(), 5);
        assert_eq!(Timer::new("a", "b", 7, true).halfway_point(), 3);
        assert_eq!(Timer::new("a", "b", 1, true).halfway_point(), 0);
    }

    #[test]
    fn reconcile_restores_immutable_fields_and_invariants() {
        let original = Timer::new("Tea", "Kitchen", 60, true);

        let mut edited = original.clone();
        edited.id = "other".to_string();
        edited.duration = 5;
        edited.halfway_alert = false;
        edited.remaining = 500;
        edited.reconcile_with(&original);
        assert_eq!(edited.id, original.id);
        assert_eq!(edited.duration, 60);
        assert!(edited.halfway_alert);
        assert_eq!(edited.remaining, 60);
    }

    #[test]
    fn updates_cannot_complete_a_timer() {
        let mut original = Timer::new("Tea", "Kitchen", 60, true);
        original.start();
        original.remaining = 10;

        let mut zeroed = original.clone();
        zeroed.remaining = 0;
        zeroed.reconcile_with(&original);
        assert_eq!((zeroed.remaining, zeroed.status), (10, TimerStatus::Running));

        let mut marked = original.clone();
        marked.status = TimerStatus::Completed;
        marked.reconcile_with(&original);
        assert_eq!((marked.remaining, marked.status), (10, TimerStatus::Running));
    }

    #[test]
    fn updates_cannot_raise_remaining_mid_run() {
        let mut original = Timer::new("Tea", "Kitchen", 60, true);
        original.start();
        original.remaining = 20;

        let mut raised = original.clone();
        raised.remaining = 40;
        raised.reconcile_with(&original);
        assert_eq!(raised.remaining, 20);

        // A full rewind that also pauses is a reset and allowed
        let mut rewound = original.clone();
        rewound.remaining = 60;
        rewound.status = TimerStatus::Paused;
        rewound.reconcile_with(&original);
        assert_eq!((rewound.remaining, rewound.status), (60, TimerStatus::Paused));

        let mut lowered = original.clone();
        lowered.remaining = 5;
        lowered.reconcile_with(&original);
        assert_eq!(lowered.remaining, 5);
    }

    #[test]
    fn completed_timer_stays_completed_without_reset() {
        let mut original = Timer::new("Tea", "Kitchen", 60, true);
        original.remaining = 0;
        original.status = TimerStatus::Completed;

        let mut revived = original.clone();
        revived.status = TimerStatus::Running;
        revived.reconcile_with(&original);
        assert_eq!((revived.remaining, revived.status), (0, TimerStatus::Completed));

        let mut partial = original.clone();
        partial.remaining = 30;
        partial.status = TimerStatus::Paused;
        partial.reconcile_with(&original);
        assert_eq!((partial.remaining, partial.status), (0, TimerStatus::Completed));
    }

    #[test]
    fn repaired_fixes_or_drops_stored_records() {
        let mut stuck = Timer::new("Tea", "Kitchen", 5, false);
        stuck.status = TimerStatus::Running;
        stuck.remaining = 0;
        let stuck = stuck.repaired().unwrap();
        assert_eq!(stuck.status, TimerStatus::Completed);

        let mut overfull = Timer::new("Tea", "Kitchen", 5, false);
        overfull.remaining = 50;
        assert_eq!(overfull.repaired().unwrap().remaining, 5);

        let mut empty = Timer::new("Tea", "Kitchen", 5, false);
        empty.duration = 0;
        empty.remaining = 0;
        assert!(empty.repaired().is_none());
    }

    #[test]
    fn draft_validation() {
        assert_eq!(draft("", "Work", 10).validate(), Err(ValidationError::MissingFields));
        assert_eq!(draft("Focus", "  ", 10).validate(), Err(ValidationError::MissingFields));
        assert_eq!(draft("Focus", "Work", 0).validate(), Err(ValidationError::NonPositiveDuration(0)));
        assert_eq!(draft("Focus", "Work", -3).validate(), Err(ValidationError::NonPositiveDuration(-3)));
        assert_eq!(
            draft("Focus", "Work", i64::from(u32::MAX) + 1).validate(),
            Err(ValidationError::DurationTooLarge(i64::from(u32::MAX) + 1))
        );

        let timer = draft(" Focus ", "Work", 25).validate().unwrap();
        assert_eq!(timer.name, "Focus");
        assert_eq!(timer.category, "Work");
        assert_eq!(timer.duration, 25);
        assert_eq!(timer.remaining, 25);
    }

    #[test]
    fn persisted_field_names_are_camel_case() {
        let timer = Timer::new("Tea", "Kitchen", 10, true);
        let json = serde_json::to_value(&timer).unwrap();
        assert_eq!(json["halfwayAlert"], true);
        assert_eq!(json["status"], "Paused");

        let entry = HistoryEntry::completed(&timer, Utc::now());
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["duration"], "10 seconds");
        assert!(json.get("completedAt").is_some());
    }
}
