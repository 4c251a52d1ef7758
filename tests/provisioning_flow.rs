// End-to-end provisioning runs against the file-backed store, crossing a
// simulated process restart between invocations.

use std::sync::Arc;

use stream_console::checkpoint::{keys, CheckpointStore, FileCheckpointStore};
use stream_console::provisioning::mocks::{CatalogCall, MockCatalogClient, MockCatalogFailure};
use stream_console::provisioning::{ProvisioningOrchestrator, StoreCredentialSource};
use stream_console::status::provisioning_status;
use stream_console::{ProvisioningOutcome, TemplateDescriptor};

fn remux_template(id: u64, name: &str) -> TemplateDescriptor {
    TemplateDescriptor {
        id,
        name: name.to_string(),
        container: "mp4".to_string(),
        video_codec: "copy".to_string(),
        audio_codec: "copy".to_string(),
        definition: String::new(),
    }
}

async fn open_store(path: &std::path::Path) -> Arc<dyn CheckpointStore> {
    Arc::new(FileCheckpointStore::open(path).await.unwrap())
}

async fn seed_credentials(store: &dyn CheckpointStore) {
    store
        .set(keys::CLOUD_SECRET, keys::secret::SECRET_ID, "AKID")
        .await
        .unwrap();
    store
        .set(keys::CLOUD_SECRET, keys::secret::SECRET_KEY, "SKEY")
        .await
        .unwrap();
}

fn orchestrator(
    store: Arc<dyn CheckpointStore>,
) -> ProvisioningOrchestrator<MockCatalogClient, StoreCredentialSource> {
    ProvisioningOrchestrator::new(
        Arc::clone(&store),
        MockCatalogClient::new(),
        StoreCredentialSource::new(store),
        "ap-east-1".to_string(),
    )
}

#[tokio::test]
async fn resumes_after_partial_failure_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("checkpoints.json");

    // First invocation: service activation succeeds, then the region call
    // fails hard and the run aborts.
    {
        let store = open_store(&path).await;
        seed_credentials(store.as_ref()).await;
        let orchestrator = orchestrator(store);
        orchestrator
            .catalog()
            .fail_create_storage_region(MockCatalogFailure::Api {
                code: "InternalError".to_string(),
                message: "region backend down".to_string(),
            });

        orchestrator.run_provisioning().await.unwrap_err();
        assert_eq!(
            orchestrator.catalog().calls(),
            vec![
                CatalogCall::CreateService,
                CatalogCall::CreateStorageRegion {
                    region: "ap-east-1".to_string()
                },
            ]
        );
    }

    // Second invocation in a fresh process: the service checkpoint survived,
    // so only the remaining steps issue external calls.
    let store = open_store(&path).await;
    let orchestrator = orchestrator(store.clone());
    orchestrator
        .catalog()
        .set_templates(vec![remux_template(42, "Remux")]);

    let outcome = orchestrator.run_provisioning().await.unwrap();
    assert_eq!(
        outcome,
        ProvisioningOutcome::Completed {
            remux: Some(remux_template(42, "Remux")),
        }
    );
    assert!(!orchestrator
        .catalog()
        .calls()
        .contains(&CatalogCall::CreateService));

    let status = provisioning_status(store.as_ref()).await.unwrap();
    assert!(status.service_ready);
    assert!(status.storage_ready);
    assert_eq!(status.remux, Some(remux_template(42, "Remux")));
}

#[tokio::test]
async fn completed_run_is_a_no_op_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("checkpoints.json");

    {
        let store = open_store(&path).await;
        seed_credentials(store.as_ref()).await;
        let orchestrator = orchestrator(store);
        orchestrator
            .catalog()
            .set_templates(vec![remux_template(7, "Remux")]);
        orchestrator.run_provisioning().await.unwrap();
    }

    let store = open_store(&path).await;
    let orchestrator = orchestrator(store);
    let outcome = orchestrator.run_provisioning().await.unwrap();

    // Every step is already checkpointed; the catalog is never touched.
    assert_eq!(
        outcome,
        ProvisioningOutcome::Completed {
            remux: Some(remux_template(7, "Remux")),
        }
    );
    assert!(orchestrator.catalog().calls().is_empty());
}

#[tokio::test]
async fn unconfigured_credentials_leave_the_document_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("checkpoints.json");

    let store = open_store(&path).await;
    let orchestrator = orchestrator(store.clone());

    let outcome = orchestrator.run_provisioning().await.unwrap();
    assert_eq!(outcome, ProvisioningOutcome::Skipped);
    assert!(orchestrator.catalog().calls().is_empty());

    let status = provisioning_status(store.as_ref()).await.unwrap();
    assert!(!status.service_ready);
    assert!(!status.storage_ready);
}
