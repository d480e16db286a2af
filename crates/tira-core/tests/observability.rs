//! Observability tests for the admin action lifecycle.
//!
//! These tests verify that structured tracing events are emitted for
//! dispatch, denial, precheck failures, creations and partial bundles, and
//! that the global counters move.

use std::sync::Arc;

use tira_core::authz::{Action, Actor, DenialReason, Role};
use tira_core::{
    emit_action_denied, emit_action_failed, emit_bundle_partial, AddDatasetForm, AdminRequest,
    AdminService, CreateTaskForm, METRICS,
};
use tira_state::fakes::MemoryRegistry;
use tira_state::{DatasetSplit, StorageError};
use tracing_test::traced_test;

fn bundle_request() -> AdminRequest {
    AdminRequest::AddDataset(AddDatasetForm {
        dataset_id_prefix: Some("ds".into()),
        dataset_name: Some("Dataset".into()),
        master_vm_id: Some("vm-1".into()),
        task_id: Some("t1".into()),
        command: Some("eval.sh".into()),
        measures: Some("F1,f1".into()),
        create_training: true,
        create_test: true,
        ..Default::default()
    })
}

#[traced_test]
#[test]
fn test_emit_action_denied_logs_reason() {
    emit_action_denied(
        Action::CreateGroup,
        Role::Organizer,
        &DenialReason::NotOwner {
            resource_id: "vm-9".into(),
        },
    );
    assert!(logs_contain("action.denied"));
    assert!(logs_contain("vm-9"));
}

#[traced_test]
#[test]
fn test_emit_bundle_partial_logs_stage() {
    emit_bundle_partial("test", 1, &"disk full");
    assert!(logs_contain("bundle.partial"));
    assert!(logs_contain("disk full"));
}

#[traced_test]
#[tokio::test]
async fn test_denial_is_logged_but_not_returned() {
    let registry = Arc::new(MemoryRegistry::new());
    let svc = AdminService::from_registry(registry);
    let denied_before = METRICS.actions_denied();

    let env = svc
        .dispatch(&Actor::anonymous(), AdminRequest::ReloadData)
        .await;

    assert_eq!(env.errors[0].message, "permission denied");
    assert!(logs_contain("action.denied"));
    assert!(logs_contain("role_not_permitted") || logs_contain("not permitted"));
    assert!(logs_contain("action.finished"));
    assert!(METRICS.actions_denied() > denied_before);
}

#[traced_test]
#[tokio::test]
async fn test_precheck_failure_is_logged() {
    let registry = Arc::new(MemoryRegistry::new().with_vm("vm-1"));
    let svc = AdminService::from_registry(registry);

    svc.dispatch(
        &Actor::new(Role::Admin),
        AdminRequest::CreateTask(CreateTaskForm {
            task_id: Some("t1".into()),
            name: Some("T".into()),
            master_vm_id: Some("vm-1".into()),
            organizer_id: Some("org-missing".into()),
            ..Default::default()
        }),
    )
    .await;

    assert!(logs_contain("precheck.failed"));
    assert!(logs_contain("organizer does not exist: org-missing"));
}

#[traced_test]
#[tokio::test]
async fn test_store_rejection_is_logged_with_underlying_message() {
    let registry = Arc::new(
        MemoryRegistry::new()
            .with_vm("vm-1")
            .with_organizer("org-1")
            .fail_task_create(StorageError::Backend("write timeout on shard 3".into())),
    );
    let svc = AdminService::from_registry(registry);

    let env = svc
        .dispatch(
            &Actor::new(Role::Admin),
            AdminRequest::CreateTask(CreateTaskForm {
                task_id: Some("t1".into()),
                master_vm_id: Some("vm-1".into()),
                organizer_id: Some("org-1".into()),
                ..Default::default()
            }),
        )
        .await;

    assert_eq!(env.errors[0].stage, "create_task");
    assert!(logs_contain("action.failed"));
    assert!(logs_contain("create_task"));
    assert!(logs_contain("write timeout on shard 3"));
}

#[traced_test]
#[tokio::test]
async fn test_reload_failure_is_logged() {
    let registry = Arc::new(
        MemoryRegistry::new().fail_reload(StorageError::Connection("refused by peer".into())),
    );
    let svc = AdminService::from_registry(registry);

    svc.dispatch(&Actor::new(Role::Admin), AdminRequest::ReloadVms)
        .await;

    assert!(logs_contain("action.failed"));
    assert!(logs_contain("refused by peer"));
}

#[traced_test]
#[test]
fn test_emit_action_failed_logs_stage_and_error() {
    emit_action_failed(Action::AddDataset, "training", &"collaborator panicked: boom");
    assert!(logs_contain("action.failed"));
    assert!(logs_contain("collaborator panicked: boom"));
}

#[traced_test]
#[tokio::test]
async fn test_partial_bundle_emits_events_and_counts() {
    let registry = Arc::new(
        MemoryRegistry::new()
            .with_vm("vm-1")
            .with_task("t1", "vm-1")
            .fail_dataset(DatasetSplit::Test, StorageError::Backend("disk full".into())),
    );
    let svc = AdminService::from_registry(registry);
    let created_before = METRICS.entities_created();
    let partial_before = METRICS.partial_bundles();

    svc.dispatch(&Actor::new(Role::Admin), bundle_request()).await;

    assert!(logs_contain("action.dispatched"));
    assert!(logs_contain("entity.created"));
    assert!(logs_contain("bundle.partial"));
    assert!(logs_contain("tira.action"));
    // training dataset + its evaluator
    assert!(METRICS.entities_created() >= created_before + 2);
    assert!(METRICS.partial_bundles() > partial_before);
}

#[traced_test]
#[test]
fn test_metrics_flush_emits_counters() {
    METRICS.flush();
    assert!(logs_contain("actions_dispatched"));
}
