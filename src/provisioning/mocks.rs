// Mock implementations for testing - no side effects

use async_trait::async_trait;
use std::sync::Mutex;

use super::traits::{
    CatalogError, CloudCatalogClient, CloudCredentials, CredentialError, CredentialSource,
};
use super::types::{TemplateDescriptor, TemplateFilter, TemplatePage};

/// Catalog calls observed by the mock, for asserting side-effect counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogCall {
    CreateService,
    CreateStorageRegion { region: String },
    DescribeTemplates { limit: u64, offset: u64 },
}

/// Failure a mock call should produce, mapped to a fresh `CatalogError` per
/// call because the error type itself is not clonable.
#[derive(Debug, Clone)]
pub enum MockCatalogFailure {
    ServiceAlreadyExists,
    RegionAlreadyConfigured,
    Api { code: String, message: String },
}

impl MockCatalogFailure {
    fn to_error(&self) -> CatalogError {
        match self {
            MockCatalogFailure::ServiceAlreadyExists => CatalogError::ServiceAlreadyExists,
            MockCatalogFailure::RegionAlreadyConfigured => CatalogError::RegionAlreadyConfigured,
            MockCatalogFailure::Api { code, message } => CatalogError::Api {
                code: code.clone(),
                message: message.clone(),
            },
        }
    }
}

/// Mock catalog that records every call and serves configured responses.
#[derive(Debug, Default)]
pub struct MockCatalogClient {
    calls: Mutex<Vec<CatalogCall>>,
    create_service_failure: Mutex<Option<MockCatalogFailure>>,
    create_region_failure: Mutex<Option<MockCatalogFailure>>,
    describe_failure: Mutex<Option<MockCatalogFailure>>,
    templates: Mutex<Vec<TemplateDescriptor>>,
    reported_total: Mutex<Option<u64>>,
}

impl MockCatalogClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_templates(&self, templates: Vec<TemplateDescriptor>) {
        *self.templates.lock().unwrap() = templates;
    }

    /// Override the page total; defaults to the template count.
    pub fn set_reported_total(&self, total: u64) {
        *self.reported_total.lock().unwrap() = Some(total);
    }

    pub fn fail_create_service(&self, failure: MockCatalogFailure) {
        *self.create_service_failure.lock().unwrap() = Some(failure);
    }

    pub fn fail_create_storage_region(&self, failure: MockCatalogFailure) {
        *self.create_region_failure.lock().unwrap() = Some(failure);
    }

    pub fn fail_describe_templates(&self, failure: MockCatalogFailure) {
        *self.describe_failure.lock().unwrap() = Some(failure);
    }

    pub fn calls(&self) -> Vec<CatalogCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: CatalogCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CloudCatalogClient for MockCatalogClient {
    async fn create_service(&self, _credentials: &CloudCredentials) -> Result<(), CatalogError> {
        self.record(CatalogCall::CreateService);
        match &*self.create_service_failure.lock().unwrap() {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }

    async fn create_storage_region(
        &self,
        _credentials: &CloudCredentials,
        region: &str,
    ) -> Result<(), CatalogError> {
        self.record(CatalogCall::CreateStorageRegion {
            region: region.to_string(),
        });
        match &*self.create_region_failure.lock().unwrap() {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }

    async fn describe_templates(
        &self,
        _credentials: &CloudCredentials,
        filter: &TemplateFilter,
    ) -> Result<TemplatePage, CatalogError> {
        self.record(CatalogCall::DescribeTemplates {
            limit: filter.limit,
            offset: filter.offset,
        });
        if let Some(failure) = &*self.describe_failure.lock().unwrap() {
            return Err(failure.to_error());
        }
        let templates = self.templates.lock().unwrap().clone();
        let total = self
            .reported_total
            .lock()
            .unwrap()
            .unwrap_or(templates.len() as u64);
        Ok(TemplatePage { total, templates })
    }
}

/// Credential source serving a configurable pair, counting lookups.
#[derive(Debug, Default)]
pub struct MockCredentialSource {
    credentials: Mutex<Option<CloudCredentials>>,
    lookups: Mutex<u32>,
}

impl MockCredentialSource {
    /// A source with no credentials configured.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_credentials(secret_id: &str, secret_key: &str) -> Self {
        Self {
            credentials: Mutex::new(Some(CloudCredentials {
                secret_id: secret_id.to_string(),
                secret_key: secret_key.to_string(),
            })),
            lookups: Mutex::new(0),
        }
    }

    pub fn lookup_count(&self) -> u32 {
        *self.lookups.lock().unwrap()
    }
}

#[async_trait]
impl CredentialSource for MockCredentialSource {
    async fn lookup(&self) -> Result<Option<CloudCredentials>, CredentialError> {
        *self.lookups.lock().unwrap() += 1;
        Ok(self.credentials.lock().unwrap().clone())
    }
}
