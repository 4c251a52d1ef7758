// Version-upgrade state machine - conflict-guarded trigger with timed self-reset

pub mod mocks;
pub mod orchestrator;
pub mod reset;
pub mod traits;


pub use orchestrator::UpgradeOrchestrator;
pub use reset::ResetSupervisor;
pub use traits::{ExecuteError, ReleaseInfo, ResolveError, UpgradeExecutor, VersionResolver};
