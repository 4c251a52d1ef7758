// File-backed checkpoint store - JSON document on disk for the CLI binary

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use super::{CheckpointError, CheckpointStore, FLAG_CLEAR, FLAG_SET};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CheckpointDocument {
    /// workflow -> field -> value
    workflows: HashMap<String, HashMap<String, String>>,
    /// Wall-clock time of the last flush, for operators reading the file.
    #[serde(default)]
    updated_at: DateTime<Utc>,
}

/// Store persisting all namespaces as one JSON document.
///
/// Writers hold an async lock for the load-modify-flush cycle, which also
/// makes `acquire_flag` atomic within this process. Flushes go through a
/// temporary file and an atomic rename so a crash mid-write never leaves a
/// truncated document behind.
#[derive(Debug)]
pub struct FileCheckpointStore {
    path: PathBuf,
    document: Mutex<CheckpointDocument>,
}

impl FileCheckpointStore {
    /// Open the store at `path`, loading the existing document if present.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let path = path.as_ref().to_path_buf();
        let document = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no checkpoint document yet, starting empty");
                CheckpointDocument::default()
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    async fn flush(&self, document: &mut CheckpointDocument) -> Result<(), CheckpointError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        document.updated_at = Utc::now();
        let bytes = serde_json::to_vec_pretty(document)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn get(&self, workflow: &str, field: &str) -> Result<Option<String>, CheckpointError> {
        let document = self.document.lock().await;
        Ok(document
            .workflows
            .get(workflow)
            .and_then(|fields| fields.get(field))
            .cloned())
    }

    async fn set(&self, workflow: &str, field: &str, value: &str) -> Result<(), CheckpointError> {
        let mut document = self.document.lock().await;
        document
            .workflows
            .entry(workflow.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        self.flush(&mut document).await
    }

    async fn acquire_flag(&self, workflow: &str, field: &str) -> Result<bool, CheckpointError> {
        let mut document = self.document.lock().await;
        let fields = document.workflows.entry(workflow.to_string()).or_default();
        match fields.get(field).map(String::as_str) {
            None | Some("") | Some(FLAG_CLEAR) => {
                fields.insert(field.to_string(), FLAG_SET.to_string());
                self.flush(&mut document).await?;
                Ok(true)
            }
            Some(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoints.json");

        {
            let store = FileCheckpointStore::open(&path).await.unwrap();
            store.set("cloud:provision", "service", "ok").await.unwrap();
            assert!(store.acquire_flag("mgmt:upgrade", "upgrading").await.unwrap());
        }

        let store = FileCheckpointStore::open(&path).await.unwrap();
        assert_eq!(
            store.get("cloud:provision", "service").await.unwrap().as_deref(),
            Some("ok")
        );
        // Flag remains held across restarts until cleared.
        assert!(!store.acquire_flag("mgmt:upgrade", "upgrading").await.unwrap());
    }

    #[tokio::test]
    async fn open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::open(dir.path().join("missing.json"))
            .await
            .unwrap();
        assert_eq!(store.get("wf", "field").await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_flag_releases_for_next_acquire() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::open(dir.path().join("checkpoints.json"))
            .await
            .unwrap();
        assert!(store.acquire_flag("mgmt:upgrade", "upgrading").await.unwrap());
        store.clear_flag("mgmt:upgrade", "upgrading").await.unwrap();
        assert!(store.acquire_flag("mgmt:upgrade", "upgrading").await.unwrap());
    }
}
