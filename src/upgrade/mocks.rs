// Mock implementations for testing - no side effects

use async_trait::async_trait;
use std::sync::Mutex;

use super::traits::{ExecuteError, ReleaseInfo, ResolveError, UpgradeExecutor, VersionResolver};

/// Resolver serving a configurable release, counting queries.
#[derive(Debug, Default)]
pub struct MockVersionResolver {
    release: Mutex<Option<ReleaseInfo>>,
    fail: Mutex<bool>,
    queries: Mutex<u32>,
}

impl MockVersionResolver {
    pub fn with_release(latest: &str, stable: &str) -> Self {
        Self {
            release: Mutex::new(Some(ReleaseInfo {
                latest: latest.to_string(),
                stable: stable.to_string(),
            })),
            fail: Mutex::new(false),
            queries: Mutex::new(0),
        }
    }

    /// A resolver whose feed reports an empty latest release.
    pub fn with_empty_release() -> Self {
        Self::with_release("", "")
    }

    pub fn failing() -> Self {
        Self {
            release: Mutex::new(None),
            fail: Mutex::new(true),
            queries: Mutex::new(0),
        }
    }

    pub fn query_count(&self) -> u32 {
        *self.queries.lock().unwrap()
    }
}

#[async_trait]
impl VersionResolver for MockVersionResolver {
    async fn query(&self) -> Result<ReleaseInfo, ResolveError> {
        *self.queries.lock().unwrap() += 1;
        if *self.fail.lock().unwrap() {
            return Err(ResolveError::Request("connection refused".to_string()));
        }
        self.release
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ResolveError::Malformed("no release configured".to_string()))
    }
}

/// What the mock executor does with a target version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorBehavior {
    Succeed,
    Fail,
    /// Simulates a host where the executor call never returns because the
    /// process is being replaced underneath it.
    NeverReturn,
}

/// Executor recording every target it was handed.
#[derive(Debug)]
pub struct MockUpgradeExecutor {
    behavior: ExecutorBehavior,
    executed: Mutex<Vec<String>>,
}

impl MockUpgradeExecutor {
    pub fn new(behavior: ExecutorBehavior) -> Self {
        Self {
            behavior,
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn executed_targets(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpgradeExecutor for MockUpgradeExecutor {
    async fn execute(&self, target: &str) -> Result<(), ExecuteError> {
        self.executed.lock().unwrap().push(target.to_string());
        match self.behavior {
            ExecutorBehavior::Succeed => Ok(()),
            ExecutorBehavior::Fail => Err(ExecuteError::Failed("exit status 1".to_string())),
            ExecutorBehavior::NeverReturn => {
                std::future::pending::<()>().await;
                unreachable!("pending future resolved")
            }
        }
    }
}
