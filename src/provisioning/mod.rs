// Cloud provisioning workflow - one-time setup of the transcoding backend

pub mod mocks;
pub mod orchestrator;
pub mod traits;
pub mod types;

#[cfg(test)]
mod tests;

pub use orchestrator::ProvisioningOrchestrator;
pub use traits::{
    CatalogError, CloudCatalogClient, CloudCredentials, CredentialError, CredentialSource,
    StoreCredentialSource,
};
pub use types::{
    ProvisioningOutcome, RemuxSelection, TemplateDescriptor, TemplateFilter, TemplatePage,
};
