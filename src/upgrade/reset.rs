// Reset supervisor - owned, cancellable timers that clear the upgrading flag

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::checkpoint::{keys, CheckpointStore};

struct ResetTask {
    id: Uuid,
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

/// Owns every scheduled flag reset instead of detaching it.
///
/// A scheduled reset clears `mgmt:upgrade/upgrading` when its timer elapses
/// *or* when it is cancelled - cancellation hastens the reset, it never skips
/// it. Tasks are allowed to outlive the request that scheduled them; they are
/// best-effort and die with the process if the upgrade executor replaces it
/// first.
#[derive(Default)]
pub struct ResetSupervisor {
    tasks: Mutex<Vec<ResetTask>>,
}

impl ResetSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a reset that fires after `delay`, returning its id.
    pub fn schedule_reset(&self, store: Arc<dyn CheckpointStore>, delay: Duration) -> Uuid {
        let id = Uuid::new_v4();
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    debug!(%id, "reset timer elapsed");
                }
                _ = cancel_rx => {
                    debug!(%id, "reset cancelled, clearing flag now");
                }
            }
            match store
                .clear_flag(keys::MGMT_UPGRADE, keys::upgrade::UPGRADING)
                .await
            {
                Ok(()) => warn!(%id, "reset upgrading flag"),
                Err(err) => warn!(%id, error = %err, "failed to reset upgrading flag"),
            }
        });

        let mut tasks = match self.tasks.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        };
        tasks.push(ResetTask {
            id,
            cancel: Some(cancel_tx),
            handle,
        });
        id
    }

    /// Number of scheduled resets that have not completed yet.
    pub fn pending(&self) -> usize {
        let tasks = match self.tasks.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        };
        tasks.iter().filter(|t| !t.handle.is_finished()).count()
    }

    /// Cancel every scheduled reset. Each cancelled task still clears the
    /// flag, immediately instead of at its deadline.
    pub fn cancel_all(&self) {
        let mut tasks = match self.tasks.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        };
        for task in tasks.iter_mut() {
            if let Some(cancel) = task.cancel.take() {
                // Receiver may already be gone if the timer fired.
                let _ = cancel.send(());
            }
        }
    }

    /// Wait for every scheduled reset to finish. Used by tests and by the CLI
    /// before exiting, so the safety net actually runs.
    pub async fn drain(&self) {
        let drained: Vec<ResetTask> = {
            let mut tasks = match self.tasks.lock() {
                Ok(tasks) => tasks,
                Err(poisoned) => poisoned.into_inner(),
            };
            tasks.drain(..).collect()
        };
        for task in drained {
            if let Err(err) = task.handle.await {
                warn!(id = %task.id, error = %err, "reset task panicked");
            }
        }
    }
}
