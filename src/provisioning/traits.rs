// Traits for dependency injection - the provisioning workflow's external seams

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::checkpoint::{keys, CheckpointError, CheckpointStore};
use crate::workflow::{Classify, Disposition};

use super::types::{TemplateFilter, TemplatePage};

/// Secret pair for the external cloud account.
#[derive(Debug, Clone)]
pub struct CloudCredentials {
    pub secret_id: String,
    pub secret_key: String,
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential lookup failed: {0}")]
    Lookup(#[from] CheckpointError),
}

/// Lookup of the cloud secret pair. Absence is not an error: provisioning is
/// optional infrastructure and silently skips without credentials.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn lookup(&self) -> Result<Option<CloudCredentials>, CredentialError>;
}

/// Reads the secret pair from the `cloud:secret` checkpoint namespace, where
/// the console keeps operator-supplied vendor credentials.
pub struct StoreCredentialSource {
    store: Arc<dyn CheckpointStore>,
}

impl StoreCredentialSource {
    pub fn new(store: Arc<dyn CheckpointStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CredentialSource for StoreCredentialSource {
    async fn lookup(&self) -> Result<Option<CloudCredentials>, CredentialError> {
        let secret_id = self
            .store
            .get(keys::CLOUD_SECRET, keys::secret::SECRET_ID)
            .await?;
        let secret_key = self
            .store
            .get(keys::CLOUD_SECRET, keys::secret::SECRET_KEY)
            .await?;
        match (secret_id, secret_key) {
            (Some(secret_id), Some(secret_key))
                if !secret_id.is_empty() && !secret_key.is_empty() =>
            {
                Ok(Some(CloudCredentials {
                    secret_id,
                    secret_key,
                }))
            }
            _ => Ok(None),
        }
    }
}

/// Failures from the cloud catalog. The two already-exists variants are the
/// closed set of codes the classifier treats as idempotent success.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("transcoding service already provisioned")]
    ServiceAlreadyExists,

    #[error("storage region already configured")]
    RegionAlreadyConfigured,

    #[error("cloud API error {code}: {message}")]
    Api { code: String, message: String },

    #[error("cloud API transport error: {0}")]
    Transport(String),

    #[error("failed to encode checkpoint payload: {0}")]
    Encode(#[from] serde_json::Error),
}

impl Classify for CatalogError {
    fn disposition(&self) -> Disposition {
        match self {
            CatalogError::ServiceAlreadyExists | CatalogError::RegionAlreadyConfigured => {
                Disposition::IdempotentSuccess
            }
            CatalogError::Api { .. } | CatalogError::Transport(_) | CatalogError::Encode(_) => {
                Disposition::Fatal
            }
        }
    }
}

/// Cloud catalog operations used by provisioning.
#[async_trait]
pub trait CloudCatalogClient: Send + Sync {
    /// Activate the transcoding service on the account.
    async fn create_service(&self, credentials: &CloudCredentials) -> Result<(), CatalogError>;

    /// Configure a storage region for transcoded output.
    async fn create_storage_region(
        &self,
        credentials: &CloudCredentials,
        region: &str,
    ) -> Result<(), CatalogError>;

    /// Page through the processing-template catalog.
    async fn describe_templates(
        &self,
        credentials: &CloudCredentials,
        filter: &TemplateFilter,
    ) -> Result<TemplatePage, CatalogError>;
}
