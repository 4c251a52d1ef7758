// Tests for the provisioning workflow

use std::sync::Arc;

use crate::checkpoint::{keys, CheckpointStore, MemoryCheckpointStore};
use crate::workflow::WorkflowError;

use super::mocks::{CatalogCall, MockCatalogClient, MockCatalogFailure, MockCredentialSource};
use super::orchestrator::ProvisioningOrchestrator;
use super::types::{ProvisioningOutcome, TemplateDescriptor};

fn template(id: u64, name: &str, container: &str, video: &str, audio: &str) -> TemplateDescriptor {
    TemplateDescriptor {
        id,
        name: name.to_string(),
        container: container.to_string(),
        video_codec: video.to_string(),
        audio_codec: audio.to_string(),
        definition: String::new(),
    }
}

fn orchestrator_with(
    store: Arc<MemoryCheckpointStore>,
    catalog: MockCatalogClient,
) -> ProvisioningOrchestrator<MockCatalogClient, MockCredentialSource> {
    ProvisioningOrchestrator::new(
        store,
        catalog,
        MockCredentialSource::with_credentials("id", "key"),
        "ap-east-1",
    )
}

#[tokio::test]
async fn missing_credentials_skip_all_steps() {
    let store = Arc::new(MemoryCheckpointStore::new());
    let catalog = MockCatalogClient::new();
    let orchestrator =
        ProvisioningOrchestrator::new(store.clone(), catalog, MockCredentialSource::empty(), "r");

    let outcome = orchestrator.run_provisioning().await.unwrap();

    assert_eq!(outcome, ProvisioningOutcome::Skipped);
    assert!(store.namespace(keys::CLOUD_PROVISION).unwrap().is_empty());
}

#[tokio::test]
async fn full_run_checkpoints_every_step() {
    let store = Arc::new(MemoryCheckpointStore::new());
    let catalog = MockCatalogClient::new();
    catalog.set_templates(vec![template(7, "Remux", "mp4", "copy", "copy")]);
    let orchestrator = orchestrator_with(store.clone(), catalog);

    let outcome = orchestrator.run_provisioning().await.unwrap();

    match outcome {
        ProvisioningOutcome::Completed { remux: Some(t) } => assert_eq!(t.id, 7),
        other => panic!("unexpected outcome {other:?}"),
    }
    let fields = store.namespace(keys::CLOUD_PROVISION).unwrap();
    assert_eq!(fields.get("service").map(String::as_str), Some("ok"));
    assert_eq!(fields.get("storage").map(String::as_str), Some("ok"));
    assert!(fields.contains_key("transcode"));
    assert!(fields.contains_key("remux"));
}

#[tokio::test]
async fn second_invocation_makes_no_external_calls() {
    let store = Arc::new(MemoryCheckpointStore::new());
    let catalog = MockCatalogClient::new();
    catalog.set_templates(vec![
        template(1, "HD Transcode", "mp4", "h264", "aac"),
        template(2, "Remux", "mp4", "copy", "copy"),
    ]);
    let orchestrator = orchestrator_with(store, catalog);

    let first = orchestrator.run_provisioning().await.unwrap();
    let calls_after_first = orchestrator_calls(&orchestrator).len();
    let second = orchestrator.run_provisioning().await.unwrap();

    assert_eq!(orchestrator_calls(&orchestrator).len(), calls_after_first);
    assert_eq!(first, second);
}

fn orchestrator_calls(
    orchestrator: &ProvisioningOrchestrator<MockCatalogClient, MockCredentialSource>,
) -> Vec<CatalogCall> {
    orchestrator.catalog().calls()
}

#[tokio::test]
async fn already_exists_is_treated_as_done() {
    let store = Arc::new(MemoryCheckpointStore::new());
    let catalog = MockCatalogClient::new();
    catalog.fail_create_service(MockCatalogFailure::ServiceAlreadyExists);
    catalog.fail_create_storage_region(MockCatalogFailure::RegionAlreadyConfigured);
    catalog.set_templates(vec![template(1, "Remux", "mp4", "copy", "copy")]);
    let orchestrator = orchestrator_with(store.clone(), catalog);

    let outcome = orchestrator.run_provisioning().await.unwrap();

    assert!(matches!(outcome, ProvisioningOutcome::Completed { .. }));
    let fields = store.namespace(keys::CLOUD_PROVISION).unwrap();
    assert_eq!(fields.get("service").map(String::as_str), Some("ok"));
    assert_eq!(fields.get("storage").map(String::as_str), Some("ok"));
}

#[tokio::test]
async fn fatal_failure_aborts_remaining_steps() {
    let store = Arc::new(MemoryCheckpointStore::new());
    let catalog = MockCatalogClient::new();
    catalog.fail_create_storage_region(MockCatalogFailure::Api {
        code: "InternalError".to_string(),
        message: "try later".to_string(),
    });
    let orchestrator = orchestrator_with(store.clone(), catalog);

    let err = orchestrator.run_provisioning().await.unwrap_err();

    assert!(matches!(err, WorkflowError::Step { ref field, .. } if field == "storage"));
    let calls = orchestrator.catalog().calls();
    assert!(!calls
        .iter()
        .any(|c| matches!(c, CatalogCall::DescribeTemplates { .. })));
    // The failing step wrote no checkpoint, so the next invocation retries it
    // without re-running the service step.
    let fields = store.namespace(keys::CLOUD_PROVISION).unwrap();
    assert!(fields.contains_key("service"));
    assert!(!fields.contains_key("storage"));
}

#[tokio::test]
async fn deprecated_templates_are_filtered_out() {
    let store = Arc::new(MemoryCheckpointStore::new());
    let catalog = MockCatalogClient::new();
    catalog.set_templates(vec![
        template(1, "XDeprecatedY", "mp4", "copy", "copy"),
        template(2, "Keeper", "mp4", "copy", "copy"),
    ]);
    let orchestrator = orchestrator_with(store.clone(), catalog);

    let outcome = orchestrator.run_provisioning().await.unwrap();

    match outcome {
        ProvisioningOutcome::Completed { remux: Some(t) } => assert_eq!(t.name, "Keeper"),
        other => panic!("unexpected outcome {other:?}"),
    }
    let raw = store
        .get(keys::CLOUD_PROVISION, keys::provision::TRANSCODE)
        .await
        .unwrap()
        .unwrap();
    assert!(!raw.contains("XDeprecatedY"));
}

#[tokio::test]
async fn selection_picks_first_matching_template() {
    let store = Arc::new(MemoryCheckpointStore::new());
    let catalog = MockCatalogClient::new();
    catalog.set_templates(vec![
        template(1, "A", "mp4", "copy", "copy"),
        template(2, "B", "mp4", "copy", "copy"),
    ]);
    let orchestrator = orchestrator_with(store, catalog);

    let outcome = orchestrator.run_provisioning().await.unwrap();

    match outcome {
        ProvisioningOutcome::Completed { remux: Some(t) } => assert_eq!(t.name, "A"),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn no_matching_template_is_still_success() {
    let store = Arc::new(MemoryCheckpointStore::new());
    let catalog = MockCatalogClient::new();
    catalog.set_templates(vec![
        template(1, "HD", "mp4", "h264", "aac"),
        template(2, "HLS Copy", "hls", "copy", "copy"),
    ]);
    let orchestrator = orchestrator_with(store.clone(), catalog);

    let outcome = orchestrator.run_provisioning().await.unwrap();

    assert_eq!(outcome, ProvisioningOutcome::Completed { remux: None });
    // The empty selection is checkpointed, so it is not retried either.
    assert!(store
        .get(keys::CLOUD_PROVISION, keys::provision::REMUX)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn truncated_catalog_page_still_proceeds() {
    let store = Arc::new(MemoryCheckpointStore::new());
    let catalog = MockCatalogClient::new();
    catalog.set_templates(vec![template(1, "Remux", "mp4", "copy", "copy")]);
    catalog.set_reported_total(250);
    let orchestrator = orchestrator_with(store, catalog);

    // Best-effort policy: a full page is logged, never fatal.
    let outcome = orchestrator.run_provisioning().await.unwrap();
    assert!(matches!(
        outcome,
        ProvisioningOutcome::Completed { remux: Some(_) }
    ));
}

#[tokio::test]
async fn malformed_discovery_checkpoint_is_fatal() {
    let store = Arc::new(MemoryCheckpointStore::new());
    store
        .set(keys::CLOUD_PROVISION, keys::provision::SERVICE, "ok")
        .await
        .unwrap();
    store
        .set(keys::CLOUD_PROVISION, keys::provision::STORAGE, "ok")
        .await
        .unwrap();
    store
        .set(keys::CLOUD_PROVISION, keys::provision::TRANSCODE, "not json")
        .await
        .unwrap();
    let orchestrator = orchestrator_with(store, MockCatalogClient::new());

    let err = orchestrator.run_provisioning().await.unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::MalformedState { ref field, .. } if field == "transcode"
    ));
}
