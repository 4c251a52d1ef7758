// Stream Console Library - checkpointed workflows for a streaming-media ops console
// This exposes the core components for testing and integration

pub mod checkpoint;
pub mod config;
pub mod external;
pub mod provisioning;
pub mod status;
pub mod telemetry;
pub mod upgrade;
pub mod workflow;

// Re-export key types for easy access
pub use checkpoint::{keys, CheckpointError, CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};
pub use config::ConsoleConfig;
pub use external::{ExecApiCatalogClient, ExecApiUpgradeExecutor, HttpVersionResolver};
pub use provisioning::{
    CloudCatalogClient, CloudCredentials, CredentialSource, ProvisioningOrchestrator,
    ProvisioningOutcome, StoreCredentialSource, TemplateDescriptor,
};
pub use status::{provisioning_status, upgrade_status, ProvisioningStatus, UpgradeStatus};
pub use telemetry::init_telemetry;
pub use upgrade::{ResetSupervisor, UpgradeExecutor, UpgradeOrchestrator, VersionResolver};
pub use workflow::{run_step, Classify, Disposition, WorkflowError, WorkflowStep, STEP_DONE};
