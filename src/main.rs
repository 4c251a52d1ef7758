use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use stream_console::checkpoint::{keys, CheckpointStore, FileCheckpointStore};
use stream_console::config::ConsoleConfig;
use stream_console::external::{ExecApiCatalogClient, ExecApiUpgradeExecutor, HttpVersionResolver};
use stream_console::provisioning::{ProvisioningOrchestrator, ProvisioningOutcome, StoreCredentialSource};
use stream_console::status::{provisioning_status, upgrade_status};
use stream_console::telemetry::init_telemetry;
use stream_console::upgrade::UpgradeOrchestrator;
use stream_console::workflow::WorkflowError;

#[derive(Parser)]
#[command(name = "stream-console")]
#[command(about = "Operations console workflows for a streaming-media platform")]
#[command(long_about = "Coordinates the checkpointed cloud-provisioning workflow and the \
                       conflict-guarded version-upgrade state machine. All cross-invocation \
                       state lives in the checkpoint store, so every command is safe to re-run.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display upgrade and provisioning state from the checkpoint store
    Status,
    /// Provision cloud transcoding resources (idempotent; resumes after partial failure)
    Provision,
    /// Trigger a version upgrade against the release feed
    Upgrade,
}

#[tokio::main]
async fn main() -> Result<()> {
    ConsoleConfig::load_env_file()?;
    let config = ConsoleConfig::load()?;
    init_telemetry(&config.observability)?;

    let cli = Cli::parse();
    let store: Arc<dyn CheckpointStore> =
        Arc::new(FileCheckpointStore::open(&config.store.path).await?);

    match cli.command {
        Commands::Status => {
            let upgrade = upgrade_status(store.as_ref(), &config.upgrade.current_version).await?;
            let provisioning = provisioning_status(store.as_ref()).await?;
            println!("{}", serde_json::to_string_pretty(&upgrade)?);
            println!("{}", serde_json::to_string_pretty(&provisioning)?);
        }
        Commands::Provision => {
            seed_credentials(store.as_ref(), &config).await?;
            let orchestrator = ProvisioningOrchestrator::new(
                store.clone(),
                ExecApiCatalogClient::new(&config.cloud.exec_api_url),
                StoreCredentialSource::new(store.clone()),
                config.cloud.region.clone(),
            );
            match orchestrator.run_provisioning().await? {
                ProvisioningOutcome::Skipped => {
                    println!("no cloud credentials configured, nothing to provision");
                }
                ProvisioningOutcome::Completed { remux } => match remux {
                    Some(template) => println!("provisioned; remux template: {}", template.name),
                    None => println!("provisioned; no remux template available"),
                },
            }
        }
        Commands::Upgrade => {
            let orchestrator = UpgradeOrchestrator::new(
                store.clone(),
                HttpVersionResolver::new(
                    &config.upgrade.release_feed_url,
                    &config.upgrade.current_version,
                ),
                ExecApiUpgradeExecutor::new(&config.cloud.exec_api_url),
                config.upgrade.current_version.clone(),
            )
            .with_timing(config.upgrade.grace_delay(), config.upgrade.reset_after());

            match orchestrator.request_upgrade().await {
                Ok(target) => {
                    println!("upgrading to {target}");
                    // Keep the process alive long enough for the safety-net
                    // reset to run if the executor did not replace us.
                    orchestrator.supervisor().drain().await;
                }
                Err(WorkflowError::Conflict) => {
                    println!("an upgrade is already in progress");
                    std::process::exit(1);
                }
                Err(err) => {
                    orchestrator.supervisor().drain().await;
                    return Err(err.into());
                }
            }
        }
    }

    Ok(())
}

/// Copy an operator-supplied secret pair from config into the credential
/// namespace, where the provisioning workflow looks it up.
async fn seed_credentials(store: &dyn CheckpointStore, config: &ConsoleConfig) -> Result<()> {
    if let (Some(secret_id), Some(secret_key)) =
        (&config.cloud.secret_id, &config.cloud.secret_key)
    {
        store
            .set(keys::CLOUD_SECRET, keys::secret::SECRET_ID, secret_id)
            .await?;
        store
            .set(keys::CLOUD_SECRET, keys::secret::SECRET_KEY, secret_key)
            .await?;
        info!("cloud credentials loaded into credential namespace");
    }
    Ok(())
}
