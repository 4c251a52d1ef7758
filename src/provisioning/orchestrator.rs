// Provisioning orchestrator - four checkpointed steps, strictly in order

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::checkpoint::{keys, CheckpointError, CheckpointStore};
use crate::workflow::{
    run_step, Classify, Disposition, IntoWorkflowError, WorkflowError, WorkflowStep, STEP_DONE,
};

use super::traits::{CatalogError, CloudCatalogClient, CloudCredentials, CredentialSource};
use super::types::{ProvisioningOutcome, RemuxSelection, TemplateDescriptor, TemplateFilter};

impl IntoWorkflowError for CatalogError {
    fn into_workflow_error(self, workflow: &str, field: &str) -> WorkflowError {
        WorkflowError::Step {
            workflow: workflow.to_string(),
            field: field.to_string(),
            source: self.into(),
        }
    }
}

impl From<super::traits::CredentialError> for WorkflowError {
    fn from(err: super::traits::CredentialError) -> Self {
        match err {
            super::traits::CredentialError::Lookup(source) => WorkflowError::Store(source),
        }
    }
}

/// Prepares the cloud transcoding backend: service activation, storage region,
/// template discovery, remux selection. Each step checkpoints under the
/// `cloud:provision` namespace, so re-invocation performs no duplicate
/// external side effects and a partial failure resumes at the failing step.
pub struct ProvisioningOrchestrator<C, S> {
    store: Arc<dyn CheckpointStore>,
    catalog: C,
    credentials: S,
    region: String,
}

impl<C, S> ProvisioningOrchestrator<C, S>
where
    C: CloudCatalogClient,
    S: CredentialSource,
{
    pub fn new(
        store: Arc<dyn CheckpointStore>,
        catalog: C,
        credentials: S,
        region: impl Into<String>,
    ) -> Self {
        Self {
            store,
            catalog,
            credentials,
            region: region.into(),
        }
    }

    /// The catalog collaborator, exposed for call-count assertions in tests.
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Run the workflow to completion, or to the first fatal failure.
    ///
    /// Without a credential pair this is a silent skip, not an error:
    /// provisioning is optional infrastructure.
    pub async fn run_provisioning(&self) -> Result<ProvisioningOutcome, WorkflowError> {
        let Some(credentials) = self.credentials.lookup().await? else {
            debug!("no cloud credentials configured, skipping provisioning");
            return Ok(ProvisioningOutcome::Skipped);
        };

        let store = self.store.as_ref();

        run_step(
            store,
            &CreateServiceStep {
                catalog: &self.catalog,
                credentials: &credentials,
            },
        )
        .await?;

        run_step(
            store,
            &CreateStorageRegionStep {
                catalog: &self.catalog,
                credentials: &credentials,
                region: &self.region,
            },
        )
        .await?;

        run_step(
            store,
            &DiscoverTemplatesStep {
                catalog: &self.catalog,
                credentials: &credentials,
            },
        )
        .await?;

        let raw = run_step(store, &SelectRemuxStep { store }).await?;
        let selection: RemuxSelection =
            serde_json::from_str(&raw).map_err(|source| WorkflowError::MalformedState {
                workflow: keys::CLOUD_PROVISION.to_string(),
                field: keys::provision::REMUX.to_string(),
                source,
            })?;

        info!(
            remux = selection.template.as_ref().map(|t| t.name.as_str()),
            "provisioning complete"
        );
        Ok(ProvisioningOutcome::Completed {
            remux: selection.template,
        })
    }
}

struct CreateServiceStep<'a, C> {
    catalog: &'a C,
    credentials: &'a CloudCredentials,
}

#[async_trait]
impl<C: CloudCatalogClient> WorkflowStep for CreateServiceStep<'_, C> {
    type Error = CatalogError;

    fn workflow(&self) -> &str {
        keys::CLOUD_PROVISION
    }

    fn field(&self) -> &str {
        keys::provision::SERVICE
    }

    async fn execute(&self) -> Result<String, CatalogError> {
        self.catalog.create_service(self.credentials).await?;
        Ok(STEP_DONE.to_string())
    }
}

struct CreateStorageRegionStep<'a, C> {
    catalog: &'a C,
    credentials: &'a CloudCredentials,
    region: &'a str,
}

#[async_trait]
impl<C: CloudCatalogClient> WorkflowStep for CreateStorageRegionStep<'_, C> {
    type Error = CatalogError;

    fn workflow(&self) -> &str {
        keys::CLOUD_PROVISION
    }

    fn field(&self) -> &str {
        keys::provision::STORAGE
    }

    async fn execute(&self) -> Result<String, CatalogError> {
        self.catalog
            .create_storage_region(self.credentials, self.region)
            .await?;
        Ok(STEP_DONE.to_string())
    }
}

struct DiscoverTemplatesStep<'a, C> {
    catalog: &'a C,
    credentials: &'a CloudCredentials,
}

#[async_trait]
impl<C: CloudCatalogClient> WorkflowStep for DiscoverTemplatesStep<'_, C> {
    type Error = CatalogError;

    fn workflow(&self) -> &str {
        keys::CLOUD_PROVISION
    }

    fn field(&self) -> &str {
        keys::provision::TRANSCODE
    }

    async fn execute(&self) -> Result<String, CatalogError> {
        let filter = TemplateFilter::preset_video_page();
        let page = self
            .catalog
            .describe_templates(self.credentials, &filter)
            .await?;

        if page.total >= filter.limit {
            warn!(
                total = page.total,
                limit = filter.limit,
                "template catalog reports at least a full page, results may be truncated"
            );
        }

        let templates: Vec<TemplateDescriptor> = page
            .templates
            .into_iter()
            .filter(|template| !template.is_deprecated())
            .collect();
        debug!(count = templates.len(), "discovered usable templates");

        Ok(serde_json::to_string(&templates)?)
    }
}

/// Failures of the selection step. All fatal: a malformed discovery checkpoint
/// requires external remediation rather than auto-repair.
#[derive(Debug, Error)]
enum SelectionError {
    #[error("checkpoint store: {0}")]
    Store(#[from] CheckpointError),

    #[error("discovery checkpoint is malformed: {0}")]
    Malformed(serde_json::Error),

    #[error("failed to encode selection: {0}")]
    Encode(serde_json::Error),
}

impl Classify for SelectionError {
    fn disposition(&self) -> Disposition {
        match self {
            SelectionError::Store(_) | SelectionError::Malformed(_) | SelectionError::Encode(_) => {
                Disposition::Fatal
            }
        }
    }
}

impl IntoWorkflowError for SelectionError {
    fn into_workflow_error(self, workflow: &str, field: &str) -> WorkflowError {
        match self {
            SelectionError::Store(source) => WorkflowError::Store(source),
            SelectionError::Malformed(source) => WorkflowError::MalformedState {
                workflow: workflow.to_string(),
                // The malformed record is the discovery checkpoint this step
                // reads, not the field it writes.
                field: keys::provision::TRANSCODE.to_string(),
                source,
            },
            SelectionError::Encode(source) => WorkflowError::Step {
                workflow: workflow.to_string(),
                field: field.to_string(),
                source: source.into(),
            },
        }
    }
}

struct SelectRemuxStep<'a> {
    store: &'a dyn CheckpointStore,
}

#[async_trait]
impl WorkflowStep for SelectRemuxStep<'_> {
    type Error = SelectionError;

    fn workflow(&self) -> &str {
        keys::CLOUD_PROVISION
    }

    fn field(&self) -> &str {
        keys::provision::REMUX
    }

    async fn execute(&self) -> Result<String, SelectionError> {
        // Re-read discovery from the store rather than taking it in memory:
        // any process with store access can resume this step.
        let raw = self
            .store
            .get(keys::CLOUD_PROVISION, keys::provision::TRANSCODE)
            .await?
            .unwrap_or_default();
        let templates: Vec<TemplateDescriptor> =
            serde_json::from_str(&raw).map_err(SelectionError::Malformed)?;

        let selection = RemuxSelection {
            template: templates.into_iter().find(TemplateDescriptor::is_remux),
        };
        match &selection.template {
            Some(template) => debug!(name = %template.name, id = template.id, "selected remux template"),
            None => warn!("no remux template (mp4, copy/copy) found in catalog"),
        }

        serde_json::to_string(&selection).map_err(SelectionError::Encode)
    }
}
