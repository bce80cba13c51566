//! Debounced draft autosave.
//!
//! Independently of stage submission, the in-progress justification text is
//! persisted after a quiet period of no typing. This never advances the
//! stage index and is best-effort: failures are reported through the status
//! channel as a save indicator, never raised.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::domain::SimulationId;
use super::store::SimulationStore;
use super::workspace::SaveStatus;

pub struct DraftAutosave<S> {
    store: Arc<S>,
    simulation_id: SimulationId,
    quiet_period: Duration,
    status_tx: watch::Sender<SaveStatus>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<S: SimulationStore + 'static> DraftAutosave<S> {
    pub fn new(store: Arc<S>, simulation_id: SimulationId, quiet_period: Duration) -> Self {
        let (status_tx, _) = watch::channel(SaveStatus::Saved);
        Self {
            store,
            simulation_id,
            quiet_period,
            status_tx,
            pending: Mutex::new(None),
        }
    }

    /// Observe the saved / saving / save-failed indicator.
    pub fn status(&self) -> watch::Receiver<SaveStatus> {
        self.status_tx.subscribe()
    }

    /// Register a keystroke: the pending flush is cancelled and the quiet
    /// period restarts with the latest text.
    pub fn record_keystroke(&self, text: String) {
        let store = Arc::clone(&self.store);
        let id = self.simulation_id.clone();
        let quiet = self.quiet_period;
        let status_tx = self.status_tx.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            // send_replace records the status even while nobody subscribes;
            // the indicator must show the latest state whenever the UI asks.
            status_tx.send_replace(SaveStatus::Saving);
            match store.persist_draft(&id, &text) {
                Ok(()) => {
                    status_tx.send_replace(SaveStatus::Saved);
                }
                Err(err) => {
                    debug!(simulation = %id.0, error = %err, "draft autosave failed");
                    status_tx.send_replace(SaveStatus::Failed {
                        detail: err.to_string(),
                    });
                }
            }
        });

        self.replace_pending(Some(handle));
    }

    /// Cancel any pending flush. Called after a successful submission so a
    /// stale draft never overwrites the next stage's text.
    pub fn cancel(&self) {
        self.replace_pending(None);
    }

    fn replace_pending(&self, next: Option<JoinHandle<()>>) {
        let mut guard = self.pending.lock().expect("autosave mutex poisoned");
        if let Some(previous) = guard.take() {
            previous.abort();
        }
        *guard = next;
    }
}

impl<S> Drop for DraftAutosave<S> {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.pending.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}
