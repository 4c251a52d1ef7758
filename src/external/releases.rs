// Release feed client - resolves the latest/stable channels over HTTP

use async_trait::async_trait;
use std::time::Duration;

use crate::upgrade::traits::{ReleaseInfo, ResolveError, VersionResolver};

/// Queries the release feed, reporting the caller's current version so the
/// feed can keep rollout statistics.
pub struct HttpVersionResolver {
    client: reqwest::Client,
    url: String,
    current_version: String,
}

impl HttpVersionResolver {
    pub fn new(url: impl Into<String>, current_version: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            current_version: current_version.into(),
        }
    }
}

#[async_trait]
impl VersionResolver for HttpVersionResolver {
    async fn query(&self) -> Result<ReleaseInfo, ResolveError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("version", self.current_version.as_str())])
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|err| ResolveError::Request(err.to_string()))?
            .error_for_status()
            .map_err(|err| ResolveError::Request(err.to_string()))?;

        response
            .json::<ReleaseInfo>()
            .await
            .map_err(|err| ResolveError::Malformed(err.to_string()))
    }
}
