// Exec API bridge - privileged actions proxied through the management sidecar

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::provisioning::traits::{CatalogError, CloudCatalogClient, CloudCredentials};
use crate::provisioning::types::{TemplateFilter, TemplatePage};
use crate::upgrade::traits::{ExecuteError, UpgradeExecutor};

/// Vendor error code meaning the transcoding service is already activated.
const CODE_SERVICE_EXISTS: &str = "ResourceAlreadyExist";
/// Vendor error code meaning the storage region is already configured.
const CODE_REGION_EXISTS: &str = "StorageRegionAlreadyExist";

#[derive(Serialize)]
struct ExecApiRequest<'a> {
    action: &'a str,
    args: Vec<&'a str>,
}

#[derive(Deserialize)]
struct ExecApiResponse<T> {
    code: i64,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

async fn exec_api<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    action: &str,
    args: Vec<&str>,
) -> Result<ExecApiResponse<T>, String> {
    let response = client
        .post(url)
        .json(&ExecApiRequest { action, args })
        .timeout(Duration::from_secs(30))
        .send()
        .await
        .map_err(|err| err.to_string())?
        .error_for_status()
        .map_err(|err| err.to_string())?;
    response
        .json::<ExecApiResponse<T>>()
        .await
        .map_err(|err| err.to_string())
}

/// Catalog client that proxies vendor calls through the sidecar's exec API,
/// translating the vendor's string error codes into the closed `CatalogError`
/// variants the classifier understands.
pub struct ExecApiCatalogClient {
    client: reqwest::Client,
    url: String,
}

impl ExecApiCatalogClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    fn map_failure<T>(response: &ExecApiResponse<T>) -> Option<CatalogError> {
        if response.code == 0 {
            return None;
        }
        let code = response.error.clone().unwrap_or_default();
        Some(match code.as_str() {
            CODE_SERVICE_EXISTS => CatalogError::ServiceAlreadyExists,
            CODE_REGION_EXISTS => CatalogError::RegionAlreadyConfigured,
            _ => CatalogError::Api {
                code,
                message: response.message.clone().unwrap_or_default(),
            },
        })
    }
}

#[async_trait]
impl CloudCatalogClient for ExecApiCatalogClient {
    async fn create_service(&self, credentials: &CloudCredentials) -> Result<(), CatalogError> {
        let response: ExecApiResponse<serde_json::Value> = exec_api(
            &self.client,
            &self.url,
            "createVodService",
            vec![credentials.secret_id.as_str()],
        )
        .await
        .map_err(CatalogError::Transport)?;
        match Self::map_failure(&response) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn create_storage_region(
        &self,
        credentials: &CloudCredentials,
        region: &str,
    ) -> Result<(), CatalogError> {
        let response: ExecApiResponse<serde_json::Value> = exec_api(
            &self.client,
            &self.url,
            "createVodStorageRegion",
            vec![credentials.secret_id.as_str(), region],
        )
        .await
        .map_err(CatalogError::Transport)?;
        match Self::map_failure(&response) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn describe_templates(
        &self,
        credentials: &CloudCredentials,
        filter: &TemplateFilter,
    ) -> Result<TemplatePage, CatalogError> {
        let limit = filter.limit.to_string();
        let offset = filter.offset.to_string();
        let response: ExecApiResponse<TemplatePage> = exec_api(
            &self.client,
            &self.url,
            "describeVodTemplates",
            vec![
                credentials.secret_id.as_str(),
                filter.template_type.as_str(),
                filter.container_type.as_str(),
                limit.as_str(),
                offset.as_str(),
            ],
        )
        .await
        .map_err(CatalogError::Transport)?;
        if let Some(err) = Self::map_failure(&response) {
            return Err(err);
        }
        response.data.ok_or_else(|| CatalogError::Api {
            code: "EmptyResponse".to_string(),
            message: "describeVodTemplates returned no data".to_string(),
        })
    }
}

/// Executor that asks the sidecar to run the upgrade script. On most hosts the
/// script replaces this process, so the call may never return.
pub struct ExecApiUpgradeExecutor {
    client: reqwest::Client,
    url: String,
}

impl ExecApiUpgradeExecutor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl UpgradeExecutor for ExecApiUpgradeExecutor {
    async fn execute(&self, target: &str) -> Result<(), ExecuteError> {
        let response: ExecApiResponse<serde_json::Value> =
            exec_api(&self.client, &self.url, "execUpgrade", vec![target])
                .await
                .map_err(ExecuteError::Failed)?;
        if response.code != 0 {
            return Err(ExecuteError::Failed(format!(
                "exec api code {}: {}",
                response.code,
                response.message.unwrap_or_default()
            )));
        }
        Ok(())
    }
}
