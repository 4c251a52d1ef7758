// Read-only status queries over checkpoint contents

use serde::Serialize;

use crate::checkpoint::{flag_is_set, keys, CheckpointStore};
use crate::provisioning::types::{RemuxSelection, TemplateDescriptor};
use crate::workflow::WorkflowError;

/// Upgrade state as seen by observing clients.
#[derive(Debug, Clone, Serialize)]
pub struct UpgradeStatus {
    pub version: String,
    pub upgrading: bool,
    pub desc: Option<String>,
    /// Upgrades only happen when requested; there is no auto-upgrade policy.
    pub strategy: &'static str,
}

pub async fn upgrade_status(
    store: &dyn CheckpointStore,
    current_version: &str,
) -> Result<UpgradeStatus, WorkflowError> {
    let upgrading = store
        .get(keys::MGMT_UPGRADE, keys::upgrade::UPGRADING)
        .await?;
    let desc = store.get(keys::MGMT_UPGRADE, keys::upgrade::DESC).await?;
    Ok(UpgradeStatus {
        version: current_version.to_string(),
        upgrading: flag_is_set(upgrading.as_deref()),
        desc,
        strategy: "manual",
    })
}

/// Provisioning progress reconstructed from the checkpoint namespace.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisioningStatus {
    pub service_ready: bool,
    pub storage_ready: bool,
    pub templates: Vec<TemplateDescriptor>,
    pub remux: Option<TemplateDescriptor>,
}

pub async fn provisioning_status(
    store: &dyn CheckpointStore,
) -> Result<ProvisioningStatus, WorkflowError> {
    let service_ready = checkpointed(store, keys::provision::SERVICE).await?;
    let storage_ready = checkpointed(store, keys::provision::STORAGE).await?;

    let templates = match store
        .get(keys::CLOUD_PROVISION, keys::provision::TRANSCODE)
        .await?
    {
        Some(raw) if !raw.is_empty() => {
            serde_json::from_str(&raw).map_err(|source| WorkflowError::MalformedState {
                workflow: keys::CLOUD_PROVISION.to_string(),
                field: keys::provision::TRANSCODE.to_string(),
                source,
            })?
        }
        _ => Vec::new(),
    };

    let remux = match store
        .get(keys::CLOUD_PROVISION, keys::provision::REMUX)
        .await?
    {
        Some(raw) if !raw.is_empty() => {
            let selection: RemuxSelection =
                serde_json::from_str(&raw).map_err(|source| WorkflowError::MalformedState {
                    workflow: keys::CLOUD_PROVISION.to_string(),
                    field: keys::provision::REMUX.to_string(),
                    source,
                })?;
            selection.template
        }
        _ => None,
    };

    Ok(ProvisioningStatus {
        service_ready,
        storage_ready,
        templates,
        remux,
    })
}

async fn checkpointed(store: &dyn CheckpointStore, field: &str) -> Result<bool, WorkflowError> {
    Ok(store
        .get(keys::CLOUD_PROVISION, field)
        .await?
        .is_some_and(|value| !value.is_empty()))
}
