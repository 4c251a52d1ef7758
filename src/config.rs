use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for the console
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConsoleConfig {
    /// External cloud account settings
    pub cloud: CloudConfig,
    /// Upgrade state machine settings
    pub upgrade: UpgradeConfig,
    /// Checkpoint store settings
    pub store: StoreConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CloudConfig {
    /// Storage region for transcoded output
    pub region: String,
    /// Vendor secret id (can be set via env var)
    pub secret_id: Option<String>,
    /// Vendor secret key (can be set via env var)
    pub secret_key: Option<String>,
    /// Exec API endpoint of the management sidecar
    pub exec_api_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpgradeConfig {
    /// Version this build reports as current
    pub current_version: String,
    /// Release feed endpoint
    pub release_feed_url: String,
    /// Grace before invoking the executor, in seconds
    pub grace_seconds: u64,
    /// Self-reset deadline for the upgrading flag, in seconds
    pub reset_seconds: u64,
}

impl UpgradeConfig {
    pub fn grace_delay(&self) -> Duration {
        Duration::from_secs(self.grace_seconds)
    }

    pub fn reset_after(&self) -> Duration {
        Duration::from_secs(self.reset_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Path to the checkpoint document
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level when RUST_LOG is unset
    pub log_level: String,
    /// Emit structured JSON logs instead of human-readable ones
    pub json_logs: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            cloud: CloudConfig {
                region: "ap-east-1".to_string(),
                secret_id: None,
                secret_key: None,
                exec_api_url: "http://127.0.0.1:2022/exec".to_string(),
            },
            upgrade: UpgradeConfig {
                current_version: format!("v{}", env!("CARGO_PKG_VERSION")),
                release_feed_url: "http://127.0.0.1:2022/releases".to_string(),
                grace_seconds: 3,
                reset_seconds: 10,
            },
            store: StoreConfig {
                path: ".stream-console/checkpoints.json".to_string(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: false,
            },
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (stream-console.toml)
    /// 3. Environment variables (prefixed with STREAM_CONSOLE_)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if Path::new("stream-console.toml").exists() {
            builder = builder.add_source(File::with_name("stream-console"));
        }

        builder = builder.add_source(
            Environment::with_prefix("STREAM_CONSOLE")
                .separator("__")
                .try_parsing(true),
        );

        let mut console_config: ConsoleConfig = builder.build()?.try_deserialize()?;

        // The secret pair is usually injected through plain env vars rather
        // than the prefixed form.
        if console_config.cloud.secret_id.is_none() {
            if let Ok(secret_id) = std::env::var("CLOUD_SECRET_ID") {
                console_config.cloud.secret_id = Some(secret_id);
            }
        }
        if console_config.cloud.secret_key.is_none() {
            if let Ok(secret_key) = std::env::var("CLOUD_SECRET_KEY") {
                console_config.cloud.secret_key = Some(secret_key);
            }
        }

        Ok(console_config)
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::debug!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_timings() {
        let config = ConsoleConfig::default();
        assert_eq!(config.upgrade.grace_delay(), Duration::from_secs(3));
        assert_eq!(config.upgrade.reset_after(), Duration::from_secs(10));
    }

    #[test]
    fn default_round_trips_through_config_builder() {
        let config = Config::builder()
            .add_source(Config::try_from(&ConsoleConfig::default()).unwrap())
            .build()
            .unwrap();
        let loaded: ConsoleConfig = config.try_deserialize().unwrap();
        assert_eq!(loaded.cloud.region, "ap-east-1");
        assert_eq!(loaded.store.path, ".stream-console/checkpoints.json");
    }
}
