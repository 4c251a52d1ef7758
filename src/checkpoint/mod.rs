// Durable checkpoint storage - field-level get/set over named workflow namespaces

use async_trait::async_trait;
use thiserror::Error;

pub mod file;
pub mod memory;

pub use file::FileCheckpointStore;
pub use memory::MemoryCheckpointStore;

/// Errors that can occur against the checkpoint backend
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Flag value recording that an exclusive operation holds the field.
pub const FLAG_SET: &str = "1";
/// Flag value recording that the field has been released.
pub const FLAG_CLEAR: &str = "0";

/// Durable key-value store keyed by (workflow, field).
///
/// Values are opaque strings. A successful `set` must be durable before it
/// returns, and records are never deleted by callers in this crate - clearing
/// a namespace is an external administrative action.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Read a field. Absent fields return `None`.
    async fn get(&self, workflow: &str, field: &str) -> Result<Option<String>, CheckpointError>;

    /// Write a field, overwriting any previous value.
    async fn set(&self, workflow: &str, field: &str, value: &str) -> Result<(), CheckpointError>;

    /// Atomically set the field to `"1"` if it is currently absent, empty, or
    /// `"0"`. Returns whether the set occurred. This is the compare-and-set
    /// primitive backing the upgrade conflict guard.
    async fn acquire_flag(&self, workflow: &str, field: &str) -> Result<bool, CheckpointError>;

    /// Write `"0"` to the field, releasing a previously acquired flag.
    async fn clear_flag(&self, workflow: &str, field: &str) -> Result<(), CheckpointError> {
        self.set(workflow, field, FLAG_CLEAR).await
    }
}

/// Workflow namespaces and field names shared by the orchestrators.
pub mod keys {
    /// Cloud provisioning workflow namespace.
    pub const CLOUD_PROVISION: &str = "cloud:provision";
    /// Vendor credential namespace.
    pub const CLOUD_SECRET: &str = "cloud:secret";
    /// Upgrade state machine namespace.
    pub const MGMT_UPGRADE: &str = "mgmt:upgrade";

    pub mod provision {
        pub const SERVICE: &str = "service";
        pub const STORAGE: &str = "storage";
        pub const TRANSCODE: &str = "transcode";
        pub const REMUX: &str = "remux";
    }

    pub mod secret {
        pub const SECRET_ID: &str = "secret_id";
        pub const SECRET_KEY: &str = "secret_key";
    }

    pub mod upgrade {
        pub const UPGRADING: &str = "upgrading";
        pub const DESC: &str = "desc";
    }
}

/// True when a stored flag value means "held".
pub fn flag_is_set(value: Option<&str>) -> bool {
    matches!(value, Some(FLAG_SET))
}
