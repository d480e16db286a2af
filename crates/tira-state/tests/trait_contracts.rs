//! Trait contract tests for EntityLookup and ProvisioningStore.
//!
//! These tests verify the behavioral contracts of the collaborator traits
//! against both the in-memory fake and the SurrealDB store. Any conforming
//! implementation must pass these.

use tira_state::fakes::MemoryRegistry;
use tira_state::*;

fn new_task(task_id: &str) -> NewTask {
    TaskRecord {
        task_id: task_id.to_string(),
        name: "Task".to_string(),
        description: "A shared task".to_string(),
        master_vm_id: "vm-master".to_string(),
        organizer_id: "org-1".to_string(),
        website: "https://example.org".to_string(),
        help_command: None,
        help_text: Some("help".to_string()),
    }
}

fn new_dataset(split: DatasetSplit) -> NewDataset {
    NewDataset {
        task_id: "t1".to_string(),
        id_prefix: "ds".to_string(),
        split,
        display_name: "DS".to_string(),
    }
}

fn new_evaluator(dataset: &DatasetRecord, measures: Vec<MeasureSpec>) -> NewEvaluator {
    NewEvaluator {
        master_vm_id: "vm-master".to_string(),
        task_id: "t1".to_string(),
        dataset_id: dataset.dataset_id.clone(),
        split: dataset.split,
        command: "eval.sh".to_string(),
        working_directory: "/work".to_string(),
        measures,
    }
}

fn measure(fields: &[&str]) -> MeasureSpec {
    MeasureSpec(fields.iter().map(|s| s.to_string()).collect())
}

async fn check_lookup_not_found(lookup: &dyn EntityLookup) {
    let err = lookup.lookup(EntityKind::Vm, "missing").await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { kind: EntityKind::Vm, .. }));
    assert!(!lookup.exists(EntityKind::Task, "missing").await.unwrap());
}

async fn check_task_create_then_conflict<S: EntityLookup + ProvisioningStore>(store: &S) {
    let created = store.create_task(new_task("t1")).await.unwrap();
    assert_eq!(created.task_id, "t1");

    match store.lookup(EntityKind::Task, "t1").await.unwrap() {
        Entity::Task(task) => assert_eq!(task.help_text.as_deref(), Some("help")),
        other => panic!("expected task, got {:?}", other),
    }

    let err = store.create_task(new_task("t1")).await.unwrap_err();
    assert!(matches!(err, StorageError::AlreadyExists { kind: EntityKind::Task, .. }));
}

async fn check_dataset_paths<S: ProvisioningStore>(store: &S) {
    let training = store.create_dataset(new_dataset(DatasetSplit::Training)).await.unwrap();
    let test = store.create_dataset(new_dataset(DatasetSplit::Test)).await.unwrap();

    assert!(training.path.starts_with("training-datasets/t1/ds-"));
    assert!(training.path.ends_with(&training.dataset_id));
    assert!(training.dataset_id.ends_with("-training"));
    assert!(test.path.starts_with("test-datasets/t1/ds-"));
}

async fn check_empty_measure_rejected<S: ProvisioningStore>(store: &S) {
    let dev = store.create_dataset(new_dataset(DatasetSplit::Dev)).await.unwrap();
    let err = store
        .create_evaluator(new_evaluator(&dev, vec![MeasureSpec::default()]))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Rejected(_)));

    store
        .create_evaluator(new_evaluator(
            &dev,
            vec![measure(&["F1", "f1"]), measure(&["Accuracy", "acc"])],
        ))
        .await
        .unwrap();
}

async fn check_evaluator_requires_registered_dataset<S: ProvisioningStore>(store: &S) {
    let training = store.create_dataset(new_dataset(DatasetSplit::Training)).await.unwrap();
    let stale = DatasetRecord {
        dataset_id: "ds-19990101-training".to_string(),
        ..training.clone()
    };

    let err = store
        .create_evaluator(new_evaluator(&stale, vec![measure(&["F1", "f1"])]))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound { kind: EntityKind::Dataset, .. }));

    store
        .create_evaluator(new_evaluator(&training, vec![measure(&["F1", "f1"])]))
        .await
        .unwrap();
}

// ===========================================================================
// MemoryRegistry
// ===========================================================================

#[tokio::test]
async fn memory_lookup_not_found() {
    check_lookup_not_found(&MemoryRegistry::new()).await;
}

#[tokio::test]
async fn memory_lookup_seeded_vm() {
    let registry = MemoryRegistry::new().with_vm("vm-1");
    let entity = registry.lookup(EntityKind::Vm, "vm-1").await.unwrap();
    assert_eq!(entity.kind(), EntityKind::Vm);
}

#[tokio::test]
async fn memory_task_create_then_conflict() {
    check_task_create_then_conflict(&MemoryRegistry::new()).await;
}

#[tokio::test]
async fn memory_dataset_paths() {
    check_dataset_paths(&MemoryRegistry::new()).await;
}

#[tokio::test]
async fn memory_empty_measure_rejected() {
    check_empty_measure_rejected(&MemoryRegistry::new()).await;
}

#[tokio::test]
async fn memory_evaluator_requires_registered_dataset() {
    let registry = MemoryRegistry::new();
    check_evaluator_requires_registered_dataset(&registry).await;

    let evaluators = registry.evaluators();
    assert_eq!(evaluators.len(), 1);
    assert_eq!(evaluators[0].dataset_id, registry.datasets()[0].dataset_id);
}

#[tokio::test]
async fn memory_unavailable_lookup_is_backend_error() {
    let registry = MemoryRegistry::new()
        .with_vm("vm-1")
        .unavailable(EntityKind::Vm);
    let err = registry.lookup(EntityKind::Vm, "vm-1").await.unwrap_err();
    assert!(matches!(err, StorageError::Backend(_)));
    assert!(registry.exists(EntityKind::Vm, "vm-1").await.is_err());
}

// ===========================================================================
// SurrealStore
// ===========================================================================

#[tokio::test]
async fn surreal_lookup_not_found() {
    let store = SurrealStore::in_memory().await.unwrap();
    check_lookup_not_found(&store).await;
}

#[tokio::test]
async fn surreal_register_and_lookup_vm() {
    let store = SurrealStore::in_memory().await.unwrap();
    store.register_vm(VmRecord::new("vm-1")).await.unwrap();

    match store.lookup(EntityKind::Vm, "vm-1").await.unwrap() {
        Entity::Vm(vm) => assert_eq!(vm.user_name, "vm-1"),
        other => panic!("expected vm, got {:?}", other),
    }

    let err = store.register_vm(VmRecord::new("vm-1")).await.unwrap_err();
    assert!(matches!(err, StorageError::AlreadyExists { .. }));
}

#[tokio::test]
async fn surreal_task_create_then_conflict() {
    let store = SurrealStore::in_memory().await.unwrap();
    check_task_create_then_conflict(&store).await;
}

#[tokio::test]
async fn surreal_dataset_paths() {
    let store = SurrealStore::in_memory().await.unwrap();
    check_dataset_paths(&store).await;

    let datasets = store.datasets_for_task("t1").await.unwrap();
    assert_eq!(datasets.len(), 2);
}

#[tokio::test]
async fn surreal_empty_measure_rejected() {
    let store = SurrealStore::in_memory().await.unwrap();
    check_empty_measure_rejected(&store).await;

    let evaluators = store.evaluators_for_task("t1").await.unwrap();
    assert_eq!(evaluators.len(), 1);
    assert_eq!(evaluators[0].measures.len(), 2);
}

#[tokio::test]
async fn surreal_evaluator_requires_registered_dataset() {
    let store = SurrealStore::in_memory().await.unwrap();
    check_evaluator_requires_registered_dataset(&store).await;

    let datasets = store.datasets_for_task("t1").await.unwrap();
    let evaluators = store.evaluators_for_task("t1").await.unwrap();
    assert_eq!(evaluators.len(), 1);
    assert_eq!(evaluators[0].dataset_id, datasets[0].dataset_id);
    assert_eq!(
        evaluators[0].evaluator_id,
        format!("{}-evaluator", datasets[0].dataset_id)
    );
}

#[tokio::test]
async fn surreal_create_group_issues_invite() {
    let store = SurrealStore::in_memory().await.unwrap();
    let invite = store.create_group(&VmRecord::new("vm-7")).await.unwrap();
    assert_eq!(invite.group_name, "tira_vm_vm-7");
    assert!(invite.invite_link.ends_with("/tira_vm_vm-7"));
}

#[tokio::test]
async fn surreal_reload_succeeds_on_live_connection() {
    let store = SurrealStore::in_memory().await.unwrap();
    store.reload(ReloadScope::All).await.unwrap();
}
