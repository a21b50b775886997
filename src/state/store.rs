//! The timer store: single owner of the timer and history collections

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use super::{
    error::StoreError,
    timer::{HistoryEntry, Timer, TimerStatus},
    transition::{advance, TickEvent, Transition},
};
use crate::{notify::EventSink, storage::PersistenceGateway};

/// Partial field update for a timer. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub remaining: Option<u32>,
    pub status: Option<TimerStatus>,
}

impl TimerPatch {
    fn apply(self, mut timer: Timer) -> Timer {
        if let Some(name) = self.name {
            timer.name = name;
        }
        if let Some(category) = self.category {
            timer.category = category;
        }
        if let Some(remaining) = self.remaining {
            timer.remaining = remaining;
        }
        if let Some(status) = self.status {
            timer.status = status;
        }
        timer
    }
}

/// An update to a single timer: either a set of fields or a function
pub enum TimerUpdate {
    SetFields(TimerPatch),
    Transform(Box<dyn FnOnce(Timer) -> Timer + Send>),
}

impl TimerUpdate {
    pub fn transform(f: impl FnOnce(Timer) -> Timer + Send + 'static) -> Self {
        TimerUpdate::Transform(Box::new(f))
    }

    fn apply(self, timer: Timer) -> Timer {
        match self {
            TimerUpdate::SetFields(patch) => patch.apply(timer),
            TimerUpdate::Transform(f) => f(timer),
        }
    }
}

/// What a single tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Timers that were running when the tick started
    pub advanced: usize,
    pub halfway: Vec<String>,
    pub completed: Vec<String>,
}

#[derive(Debug, Default)]
struct Collections {
    timers: Vec<Timer>,
    history: Vec<HistoryEntry>,
    pending_completions: Vec<String>,
    /// Bumped on every change so persistence can tell old snapshots from new
    timers_revision: u64,
    history_revision: u64,
}

/// Owns every timer and history entry and serialises all changes to them.
///
/// Commands and the tick take the same lock for their whole
/// read-compute-write step. Saving happens after the lock is released; the
/// latest snapshot is always what gets written.
pub struct TimerStore {
    collections: Mutex<Collections>,
    /// Revision last written successfully, one lock per collection
    saved_timers: AsyncMutex<u64>,
    saved_history: AsyncMutex<u64>,
    gateway: Arc<dyn PersistenceGateway>,
    sink: Arc<dyn EventSink>,
}

impl TimerStore {
    /// Load persisted timers and history and build a store around them
    pub async fn init(gateway: Arc<dyn PersistenceGateway>, sink: Arc<dyn EventSink>) -> Self {
        let loaded = gateway.load_timers().await;
        let loaded_count = loaded.len();
        let timers: Vec<Timer> = loaded
            .into_iter()
            .filter_map(|timer| {
                let original = timer.clone();
                let repaired = timer.repaired();
                match &repaired {
                    None => warn!("Dropping stored timer {:?}: zero duration or missing id", original.id),
                    Some(fixed) if *fixed != original => warn!(
                        "Repaired stored timer {}: {:?}/{}s -> {:?}/{}s",
                        fixed.id, original.status, original.remaining, fixed.status, fixed.remaining
                    ),
                    Some(_) => {}
                }
                repaired
            })
            .collect();
        if timers.len() < loaded_count {
            warn!("Dropped {} unusable stored timers", loaded_count - timers.len());
        }
        let history = gateway.load_history().await;
        info!("Loaded {} timers and {} history entries", timers.len(), history.len());

        Self {
            collections: Mutex::new(Collections {
                timers,
                history,
                ..Collections::default()
            }),
            saved_timers: AsyncMutex::new(0),
            saved_history: AsyncMutex::new(0),
            gateway,
            sink,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, StoreError> {
        self.collections
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    // Reads

    pub fn timers(&self) -> Result<Vec<Timer>, StoreError> {
        Ok(self.lock()?.timers.clone())
    }

    pub fn timer(&self, id: &str) -> Result<Option<Timer>, StoreError> {
        Ok(self.lock()?.timers.iter().find(|t| t.id == id).cloned())
    }

    pub fn history(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        Ok(self.lock()?.history.clone())
    }

    /// Names of completed timers not yet acknowledged, oldest first
    pub fn pending_completions(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.lock()?.pending_completions.clone())
    }

    /// Distinct categories in order of first appearance
    pub fn categories(&self) -> Result<Vec<String>, StoreError> {
        let state = self.lock()?;
        let mut categories: Vec<String> = Vec::new();
        for timer in &state.timers {
            if !categories.contains(&timer.category) {
                categories.push(timer.category.clone());
            }
        }
        Ok(categories)
    }

    pub fn timers_in_category(&self, category: &str) -> Result<Vec<Timer>, StoreError> {
        Ok(self
            .lock()?
            .timers
            .iter()
            .filter(|t| t.category == category)
            .cloned()
            .collect())
    }

    // Commands

    /// Append an already validated timer
    pub async fn add_timer(&self, timer: Timer) -> Result<Timer, StoreError> {
        info!("Adding timer '{}' ({}s) to category '{}'", timer.name, timer.duration, timer.category);
        {
            let mut state = self.lock()?;
            state.timers.push(timer.clone());
            state.timers_revision += 1;
        }
        self.persist_timers().await?;
        Ok(timer)
    }

    /// Apply `update` to the timer with `id`.
    ///
    /// Returns `Ok(false)` when no such timer exists. `id`, `duration` and
    /// `halfway_alert` cannot be changed this way. Neither can an update
    /// complete a timer or raise its countdown short of a full reset; only
    /// [`TimerStore::tick`] records completions.
    pub async fn update_timer(&self, id: &str, update: TimerUpdate) -> Result<bool, StoreError> {
        let found = {
            let mut guard = self.lock()?;
            let state = &mut *guard;
            match state.timers.iter_mut().find(|t| t.id == id) {
                Some(slot) => {
                    let mut updated = update.apply(slot.clone());
                    updated.reconcile_with(slot);
                    if updated != *slot {
                        *slot = updated;
                        state.timers_revision += 1;
                    }
                    true
                }
                None => false,
            }
        };

        if !found {
            debug!("Update for unknown timer {} ignored", id);
        }
        self.persist_timers().await?;
        Ok(found)
    }

    pub async fn start_timer(&self, id: &str) -> Result<bool, StoreError> {
        self.update_timer(
            id,
            TimerUpdate::transform(|mut t| {
                t.start();
                t
            }),
        )
        .await
    }

    pub async fn pause_timer(&self, id: &str) -> Result<bool, StoreError> {
        self.update_timer(
            id,
            TimerUpdate::transform(|mut t| {
                t.pause();
                t
            }),
        )
        .await
    }

    pub async fn reset_timer(&self, id: &str) -> Result<bool, StoreError> {
        self.update_timer(
            id,
            TimerUpdate::transform(|mut t| {
                t.reset();
                t
            }),
        )
        .await
    }

    /// Start every paused timer in `category`. Returns how many changed.
    pub async fn start_all_in_category(&self, category: &str) -> Result<usize, StoreError> {
        info!("Starting all timers in category '{}'", category);
        self.apply_to_category(category, Timer::start).await
    }

    /// Pause every running timer in `category`. Returns how many changed.
    pub async fn pause_all_in_category(&self, category: &str) -> Result<usize, StoreError> {
        info!("Pausing all timers in category '{}'", category);
        self.apply_to_category(category, Timer::pause).await
    }

    /// Reset every timer in `category`. Returns how many were reset.
    pub async fn reset_all_in_category(&self, category: &str) -> Result<usize, StoreError> {
        info!("Resetting all timers in category '{}'", category);
        self.apply_to_category(category, |t| {
            t.reset();
            true
        })
        .await
    }

    async fn apply_to_category<F>(&self, category: &str, mut transition: F) -> Result<usize, StoreError>
    where
        F: FnMut(&mut Timer) -> bool,
    {
        let affected = {
            let mut state = self.lock()?;
            let affected = state
                .timers
                .iter_mut()
                .filter(|t| t.category == category)
                .map(|t| transition(t))
                .filter(|changed| *changed)
                .count();
            if affected > 0 {
                state.timers_revision += 1;
            }
            affected
        };

        debug!("{} timers changed in category '{}'", affected, category);
        self.persist_timers().await?;
        Ok(affected)
    }

    /// Append a history entry
    pub async fn add_history_entry(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        {
            let mut state = self.lock()?;
            state.history.push(entry);
            state.history_revision += 1;
        }
        self.persist_history().await
    }

    /// Clear the pending completion queue, returning what was in it
    pub fn acknowledge_completions(&self) -> Result<Vec<String>, StoreError> {
        let acknowledged = std::mem::take(&mut self.lock()?.pending_completions);
        debug!("Acknowledged completions: {:?}", acknowledged);
        Ok(acknowledged)
    }

    // Tick

    /// Advance every running timer by one step as a single atomic change,
    /// record completions and notify the sink.
    ///
    /// Saving is left to the caller (see [`TimerStore::persist`]) so a slow
    /// write never holds up the tick.
    pub fn tick(&self) -> Result<TickReport, StoreError> {
        let mut report = TickReport::default();

        let pending = {
            let mut guard = self.lock()?;
            let state = &mut *guard;

            report.advanced = state
                .timers
                .iter()
                .filter(|t| t.is_running() && t.remaining > 0)
                .count();
            if report.advanced == 0 {
                return Ok(report);
            }

            let now = Utc::now();
            let mut completed_entries = Vec::new();
            let next: Vec<Timer> = state
                .timers
                .iter()
                .map(|timer| {
                    let Transition { timer, events } = advance(timer);
                    for event in events {
                        match event {
                            TickEvent::Halfway { name, .. } => report.halfway.push(name),
                            TickEvent::Completed { name, .. } => {
                                completed_entries.push(HistoryEntry::completed(&timer, now));
                                report.completed.push(name);
                            }
                        }
                    }
                    timer
                })
                .collect();

            state.timers = next;
            state.timers_revision += 1;

            if report.completed.is_empty() {
                None
            } else {
                state.history.extend(completed_entries);
                state.history_revision += 1;
                state.pending_completions.extend(report.completed.iter().cloned());
                Some(state.pending_completions.clone())
            }
        };

        for name in &report.halfway {
            self.sink.halfway(name);
        }
        if let Some(pending) = pending {
            info!("Timers completed this tick: {:?}", report.completed);
            self.sink.completions(&pending);
        }

        Ok(report)
    }

    // Persistence

    /// Save both collections if they changed since the last successful save
    pub async fn persist(&self) -> Result<(), StoreError> {
        let timers = self.persist_timers().await;
        let history = self.persist_history().await;
        timers.and(history)
    }

    /// Save the current timer list unless an equal or newer one is already saved
    pub async fn persist_timers(&self) -> Result<(), StoreError> {
        let mut saved = self.saved_timers.lock().await;
        let (revision, timers) = {
            let state = self.lock()?;
            (state.timers_revision, state.timers.clone())
        };
        if revision <= *saved {
            return Ok(());
        }

        self.gateway.save_timers(&timers).await.map_err(|source| {
            warn!("Failed to save timers (revision {}): {}", revision, source);
            StoreError::Storage { collection: "timers", source }
        })?;
        *saved = revision;
        Ok(())
    }

    /// Save the current history unless an equal or newer one is already saved
    pub async fn persist_history(&self) -> Result<(), StoreError> {
        let mut saved = self.saved_history.lock().await;
        let (revision, history) = {
            let state = self.lock()?;
            (state.history_revision, state.history.clone())
        };
        if revision <= *saved {
            return Ok(());
        }

        self.gateway.save_history(&history).await.map_err(|source| {
            warn!("Failed to save history (revision {}): {}", revision, source);
            StoreError::Storage { collection: "history", source }
        })?;
        *saved = revision;
        Ok(())
    }
}
