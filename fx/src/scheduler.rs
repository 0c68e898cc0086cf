//! Periodic background refresh of the quote table.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::engine::RateEngine;

/// Handle to the task that regenerates the engine's quotes on a fixed
/// period.
///
/// The task runs until [`RefreshScheduler::stop`] is called or the handle
/// is dropped.
pub struct RefreshScheduler {
    period: Duration,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    /// Spawn the refresh task on the current tokio runtime.
    ///
    /// The first regeneration happens one `period` after the start.
    pub fn start(engine: Arc<RateEngine>, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let snapshot = engine.regenerate();
                        debug!(generation = snapshot.generation(), "Scheduled refresh");
                    }
                }
            }

            debug!("Refresh task exited");
        });

        info!(period_secs = period.as_secs_f64(), "Refresh task started");

        Self {
            period,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Refresh period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether the task is still scheduled.
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Cancel the task. Stopping an already stopped scheduler is a no-op.
    pub fn stop(&self) {
        let Some(tx) = self.shutdown_tx.lock().take() else {
            return;
        };
        // The task may already be gone; nothing to signal then.
        let _ = tx.send(());

        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
        info!("Refresh task stopped");
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
