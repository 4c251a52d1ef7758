// The workflow step unit: checkpoint check, conditional execution, checkpoint write

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::checkpoint::CheckpointStore;
use crate::workflow::classify::{Classify, Disposition};
use crate::workflow::{IntoWorkflowError, WorkflowError};

/// Sentinel value checkpointed for steps whose success carries no payload,
/// and for steps completed by an idempotent-classified failure.
pub const STEP_DONE: &str = "ok";

/// One externally side-effecting step of a linear workflow, identified by its
/// (workflow, field) checkpoint key.
#[async_trait]
pub trait WorkflowStep: Send + Sync {
    /// Collaborator error; its classification decides whether a failure
    /// completes or aborts the step.
    type Error: Classify + IntoWorkflowError + Send;

    fn workflow(&self) -> &str;
    fn field(&self) -> &str;

    /// Perform the external call and compute the value to checkpoint.
    async fn execute(&self) -> Result<String, Self::Error>;
}

/// Run one step against the store.
///
/// A present, non-empty checkpoint means the step is done: its stored value is
/// returned and the external collaborator is not called. Otherwise the step
/// executes exactly once; success and idempotent-classified failure both
/// checkpoint before returning, a fatal failure writes nothing so the next
/// invocation retries this exact step.
pub async fn run_step<S: WorkflowStep>(
    store: &dyn CheckpointStore,
    step: &S,
) -> Result<String, WorkflowError> {
    let (workflow, field) = (step.workflow(), step.field());

    if let Some(existing) = store.get(workflow, field).await? {
        if !existing.is_empty() {
            debug!(workflow, field, "step already checkpointed, skipping");
            return Ok(existing);
        }
    }

    match step.execute().await {
        Ok(value) => {
            store.set(workflow, field, &value).await?;
            debug!(workflow, field, "step completed and checkpointed");
            Ok(value)
        }
        Err(err) if err.disposition() == Disposition::IdempotentSuccess => {
            warn!(workflow, field, "target state already exists, marking step done");
            store.set(workflow, field, STEP_DONE).await?;
            Ok(STEP_DONE.to_string())
        }
        Err(err) => Err(err.into_workflow_error(workflow, field)),
    }
}
