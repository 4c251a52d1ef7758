// Checkpointed workflow mechanics shared by provisioning and upgrade

use thiserror::Error;

use crate::checkpoint::CheckpointError;

pub mod classify;
pub mod step;

pub use classify::{Classify, Disposition};
pub use step::{run_step, WorkflowStep, STEP_DONE};

/// Conversion of a collaborator error into the surfaced workflow error,
/// carrying the failing step's checkpoint key for context.
pub trait IntoWorkflowError {
    fn into_workflow_error(self, workflow: &str, field: &str) -> WorkflowError;
}

/// Failures surfaced by orchestrators.
///
/// Missing configuration is deliberately not represented here: an absent
/// credential pair short-circuits provisioning as a silent success, not an
/// error.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The checkpoint backend itself failed.
    #[error("checkpoint store: {0}")]
    Store(#[from] CheckpointError),

    /// An upgrade is already in progress; nothing was mutated.
    #[error("upgrade already in progress")]
    Conflict,

    /// An external collaborator failed during a checkpointed step. No
    /// checkpoint was written for the failing step, so re-invoking the
    /// workflow retries it.
    #[error("step {workflow}/{field} failed: {source}")]
    Step {
        workflow: String,
        field: String,
        #[source]
        source: anyhow::Error,
    },

    /// An external collaborator failed outside step sequencing (version
    /// resolver, upgrade executor). Surfaced unchanged to the caller.
    #[error("{context} failed: {source}")]
    External {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    /// A checkpoint exists but cannot be parsed. Requires external
    /// remediation; never auto-repaired.
    #[error("checkpoint {workflow}/{field} is malformed: {source}")]
    MalformedState {
        workflow: String,
        field: String,
        #[source]
        source: serde_json::Error,
    },

    /// The version resolver returned no usable release.
    #[error("version resolver returned no usable release")]
    EmptyRelease,
}
