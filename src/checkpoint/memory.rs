// In-memory checkpoint store - process-local, used by tests and embedded setups

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{CheckpointError, CheckpointStore, FLAG_CLEAR, FLAG_SET};

/// Process-local store backed by a mutex-guarded map. The compare-and-set in
/// `acquire_flag` is atomic under the lock, so concurrent callers observe the
/// same contract as a real backend.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    records: Mutex<HashMap<(String, String), String>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every field under a workflow namespace, for status queries
    /// and test assertions.
    pub fn namespace(&self, workflow: &str) -> Result<HashMap<String, String>, CheckpointError> {
        let records = self
            .records
            .lock()
            .map_err(|_| CheckpointError::Backend("checkpoint map lock poisoned".to_string()))?;
        Ok(records
            .iter()
            .filter(|((w, _), _)| w == workflow)
            .map(|((_, f), v)| (f.clone(), v.clone()))
            .collect())
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn get(&self, workflow: &str, field: &str) -> Result<Option<String>, CheckpointError> {
        let records = self
            .records
            .lock()
            .map_err(|_| CheckpointError::Backend("checkpoint map lock poisoned".to_string()))?;
        Ok(records.get(&(workflow.to_string(), field.to_string())).cloned())
    }

    async fn set(&self, workflow: &str, field: &str, value: &str) -> Result<(), CheckpointError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| CheckpointError::Backend("checkpoint map lock poisoned".to_string()))?;
        records.insert((workflow.to_string(), field.to_string()), value.to_string());
        Ok(())
    }

    async fn acquire_flag(&self, workflow: &str, field: &str) -> Result<bool, CheckpointError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| CheckpointError::Backend("checkpoint map lock poisoned".to_string()))?;
        let key = (workflow.to_string(), field.to_string());
        match records.get(&key).map(String::as_str) {
            None | Some("") | Some(FLAG_CLEAR) => {
                records.insert(key, FLAG_SET.to_string());
                Ok(true)
            }
            Some(_) => Ok(false),
        }
    }
}
