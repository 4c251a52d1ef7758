// Upgrade orchestrator - Idle -> Upgrading -> Idle, guarded by a store flag

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::checkpoint::{flag_is_set, keys, CheckpointStore};
use crate::workflow::WorkflowError;

use super::reset::ResetSupervisor;
use super::traits::{UpgradeExecutor, VersionResolver};

/// Client-visible grace between accepting an upgrade and executing it, so an
/// observing client can register the upgrading state before the process may be
/// replaced. Not a retry or backoff.
pub const DEFAULT_GRACE_DELAY: Duration = Duration::from_secs(3);

/// Safety-net deadline after which the upgrading flag is cleared, for hosts
/// where the executor does not terminate the process as expected.
pub const DEFAULT_RESET_AFTER: Duration = Duration::from_secs(10);

/// Coordinates a version upgrade. All cross-invocation state lives in the
/// checkpoint store, so the orchestrator itself is safe to re-invoke from any
/// process.
pub struct UpgradeOrchestrator<R, E> {
    store: Arc<dyn CheckpointStore>,
    resolver: R,
    executor: E,
    current_version: String,
    grace_delay: Duration,
    reset_after: Duration,
    supervisor: ResetSupervisor,
}

impl<R, E> UpgradeOrchestrator<R, E>
where
    R: VersionResolver,
    E: UpgradeExecutor,
{
    pub fn new(
        store: Arc<dyn CheckpointStore>,
        resolver: R,
        executor: E,
        current_version: impl Into<String>,
    ) -> Self {
        Self {
            store,
            resolver,
            executor,
            current_version: current_version.into(),
            grace_delay: DEFAULT_GRACE_DELAY,
            reset_after: DEFAULT_RESET_AFTER,
            supervisor: ResetSupervisor::new(),
        }
    }

    /// Override the grace and reset intervals.
    pub fn with_timing(mut self, grace_delay: Duration, reset_after: Duration) -> Self {
        self.grace_delay = grace_delay;
        self.reset_after = reset_after;
        self
    }

    pub fn supervisor(&self) -> &ResetSupervisor {
        &self.supervisor
    }

    /// The resolver collaborator, exposed for call-count assertions in tests.
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// The executor collaborator, exposed for call-count assertions in tests.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Trigger an upgrade, returning the resolved target version.
    ///
    /// Fails with `Conflict` while another upgrade is in progress, and with no
    /// state mutated when the resolver yields nothing usable. The target is
    /// the lexical max of the latest release and the current version - a
    /// documented quirk, not semantic version ordering.
    pub async fn request_upgrade(&self) -> Result<String, WorkflowError> {
        // Fast path: reject a visibly in-progress upgrade without calling the
        // resolver.
        let flag = self
            .store
            .get(keys::MGMT_UPGRADE, keys::upgrade::UPGRADING)
            .await?;
        if flag_is_set(flag.as_deref()) {
            return Err(WorkflowError::Conflict);
        }

        let release = self
            .resolver
            .query()
            .await
            .map_err(|err| WorkflowError::External {
                context: "version resolver".to_string(),
                source: err.into(),
            })?;
        if release.latest.is_empty() {
            return Err(WorkflowError::EmptyRelease);
        }

        let target = if release.latest.as_str() < self.current_version.as_str() {
            self.current_version.clone()
        } else {
            release.latest.clone()
        };

        // Compare-and-set closes the check-then-act window between the read
        // above and this write: of two near-simultaneous requests, exactly one
        // acquires the flag.
        if !self
            .store
            .acquire_flag(keys::MGMT_UPGRADE, keys::upgrade::UPGRADING)
            .await?
        {
            return Err(WorkflowError::Conflict);
        }
        let desc = format!(
            "upgrade to target={}, current={}, latest={}",
            target, self.current_version, release.latest
        );
        // Independent write; a crash here leaves the flag set with a stale
        // desc, which the timed reset recovers.
        self.store
            .set(keys::MGMT_UPGRADE, keys::upgrade::DESC, &desc)
            .await?;
        info!(
            target,
            current = %self.current_version,
            latest = %release.latest,
            "upgrade accepted"
        );

        tokio::time::sleep(self.grace_delay).await;

        // Scheduled regardless of how the executor fares; it may never run if
        // the executor replaces this process first.
        self.supervisor
            .schedule_reset(Arc::clone(&self.store), self.reset_after);

        warn!(target, "starting upgrade executor");
        self.executor
            .execute(&target)
            .await
            .map_err(|err| WorkflowError::External {
                context: "upgrade executor".to_string(),
                source: err.into(),
            })?;
        // Note: an executor failure above does not clear the flag; only the
        // scheduled reset does.

        Ok(target)
    }
}
