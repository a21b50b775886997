//! Tick scheduler background task
//!
//! One shared driver for every timer: each period it asks the store to advance
//! all running timers as one step, then saves the result on a separate task so
//! a slow write never delays the next tick.

use std::{sync::Arc, time::Duration};
use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

use crate::state::TimerStore;

/// Time between ticks; every tick removes one second from running timers
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Owner of a running tick scheduler.
///
/// `stop` shuts it down and waits for the task to finish. Dropping the handle
/// without stopping aborts the task.
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Stop ticking and wait until the task has exited
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            // The task may already be gone; nothing to signal then
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Tick scheduler ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Spawn the scheduler with the standard one-second period
pub fn spawn_tick_scheduler(store: Arc<TimerStore>) -> SchedulerHandle {
    spawn_tick_scheduler_with_period(store, TICK_PERIOD)
}

/// Spawn the scheduler with a custom period
pub fn spawn_tick_scheduler_with_period(store: Arc<TimerStore>, period: Duration) -> SchedulerHandle {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(tick_scheduler_task(store, period, shutdown_rx));

    SchedulerHandle {
        shutdown: Some(shutdown_tx),
        task: Some(task),
    }
}

async fn tick_scheduler_task(store: Arc<TimerStore>, period: Duration, mut shutdown: oneshot::Receiver<()>) {
    info!("Starting tick scheduler ({}ms period)", period.as_millis());

    // First tick one full period after start, not immediately
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match store.tick() {
                    Ok(report) if report.advanced > 0 => {
                        debug!(
                            "Tick advanced {} timers ({} halfway, {} completed)",
                            report.advanced,
                            report.halfway.len(),
                            report.completed.len()
                        );
                        let store = Arc::clone(&store);
                        tokio::spawn(async move {
                            if let Err(e) = store.persist().await {
                                warn!("Tick state kept in memory only: {}", e);
                            }
                        });
                    }
                    Ok(_) => {}
                    Err(e) => error!("Tick failed: {}", e),
                }
            }

            // Explicit stop, or the handle was dropped
            _ = &mut shutdown => {
                info!("Tick scheduler stopped");
                break;
            }
        }
    }
}
