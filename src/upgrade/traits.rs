// Traits for dependency injection - the upgrade workflow's external seams

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::workflow::{Classify, Disposition};

/// Release channels reported by the version feed.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseInfo {
    #[serde(default)]
    pub latest: String,
    #[serde(default)]
    pub stable: String,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("release feed request failed: {0}")]
    Request(String),

    #[error("release feed returned malformed body: {0}")]
    Malformed(String),
}

/// No resolver failure means "already upgraded"; the mapping is total and
/// everything is fatal.
impl Classify for ResolveError {
    fn disposition(&self) -> Disposition {
        match self {
            ResolveError::Request(_) | ResolveError::Malformed(_) => Disposition::Fatal,
        }
    }
}

/// Resolves the available release channels.
#[async_trait]
pub trait VersionResolver: Send + Sync {
    async fn query(&self) -> Result<ReleaseInfo, ResolveError>;
}

#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("upgrade executor failed: {0}")]
    Failed(String),
}

impl Classify for ExecuteError {
    fn disposition(&self) -> Disposition {
        match self {
            ExecuteError::Failed(_) => Disposition::Fatal,
        }
    }
}

/// Hands the target version to the external upgrade mechanism. Side-effecting:
/// on most hosts this replaces or restarts the process that called it.
#[async_trait]
pub trait UpgradeExecutor: Send + Sync {
    async fn execute(&self, target: &str) -> Result<(), ExecuteError>;
}
