//! Task creation and dataset-bundle provisioning.
//!
//! Preconditions run first and short-circuit; no create call is issued
//! until every referenced entity resolved. Bundles then run split by split
//! in `training, test, dev` order and stop at the first failure, leaving
//! everything already committed in place.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tira_state::{
    EntityKind, EntityLookup, NewDataset, NewEvaluator, NewTask, ProvisioningStore,
    StorageError, StorageResult,
};
use tracing::{debug, info, instrument};

use crate::error::{AdminError, AdminResult};
use crate::guard;
use crate::metrics::METRICS;
use crate::obs;
use crate::report::Provisioned;
use crate::request::{AddDatasetRequest, CreateTaskRequest};

/// Creates tasks and dataset bundles through the injected collaborators.
#[derive(Clone)]
pub struct Provisioner {
    lookup: Arc<dyn EntityLookup>,
    store: Arc<dyn ProvisioningStore>,
}

impl Provisioner {
    pub fn new(lookup: Arc<dyn EntityLookup>, store: Arc<dyn ProvisioningStore>) -> Self {
        Self { lookup, store }
    }

    /// Create a task after checking its master VM and organizer exist and
    /// its identifier is free.
    #[instrument(skip(self, request), fields(task_id = %request.task_id))]
    pub async fn create_task(&self, request: CreateTaskRequest) -> AdminResult<Provisioned> {
        guard::resolve_as(
            self.lookup.as_ref(),
            EntityKind::Vm,
            &request.master_vm_id,
            "master VM",
        )
        .await?;
        guard::resolve_as(
            self.lookup.as_ref(),
            EntityKind::Organizer,
            &request.organizer_id,
            "organizer",
        )
        .await?;

        let taken = self
            .lookup
            .exists(EntityKind::Task, &request.task_id)
            .await
            .map_err(|e| AdminError::from_lookup(e, "task"))?;
        if taken {
            return Err(AdminError::Conflict {
                kind: EntityKind::Task,
                id: request.task_id,
            });
        }

        let task = NewTask {
            task_id: request.task_id,
            name: request.name,
            description: request.description,
            master_vm_id: request.master_vm_id,
            organizer_id: request.organizer_id,
            website: request.website,
            help_command: request.help_command,
            help_text: request.help_text,
        };
        let store = Arc::clone(&self.store);
        let record = guarded(async move { store.create_task(task).await })
            .await
            .map_err(|e| match e {
                StorageError::AlreadyExists { kind, id } => AdminError::Conflict { kind, id },
                other => AdminError::Creation {
                    stage: "create_task".to_string(),
                    message: format!("failed to create task: {other}"),
                },
            })?;

        METRICS.inc_created();
        obs::emit_entity_created("task", &record.task_id);
        Ok(Provisioned {
            message: format!("Created task with ID {}", record.task_id),
            created: vec![record.task_id],
        })
    }

    /// Create the requested dataset splits of a task, each followed by its
    /// evaluator.
    ///
    /// On failure after the first commit the error is
    /// [`AdminError::Partial`] carrying every path committed so far.
    #[instrument(skip(self, request), fields(task_id = %request.task_id, prefix = %request.id_prefix))]
    pub async fn provision_dataset_bundle(
        &self,
        request: AddDatasetRequest,
    ) -> AdminResult<Provisioned> {
        guard::resolve_as(
            self.lookup.as_ref(),
            EntityKind::Vm,
            &request.master_vm_id,
            "master VM",
        )
        .await?;
        guard::resolve(self.lookup.as_ref(), EntityKind::Task, &request.task_id).await?;

        let mut created: Vec<String> = Vec::new();
        for split in request.splits.requested() {
            debug!(split = %split, "Provisioning dataset split");

            let dataset = NewDataset {
                task_id: request.task_id.clone(),
                id_prefix: request.id_prefix.clone(),
                split,
                display_name: request.display_name.clone(),
            };
            let store = Arc::clone(&self.store);
            let registered = guarded(async move { store.create_dataset(dataset).await }).await;
            let registered = match registered {
                Ok(record) => record,
                Err(e) => {
                    let message = format!("failed to create {split} dataset: {e}");
                    return Err(split_failure(created, split.as_str().to_string(), message));
                }
            };
            METRICS.inc_created();
            obs::emit_entity_created("dataset", &registered.path);
            created.push(registered.path);

            let evaluator = NewEvaluator {
                master_vm_id: request.master_vm_id.clone(),
                task_id: request.task_id.clone(),
                dataset_id: registered.dataset_id,
                split,
                command: request.command.clone(),
                working_directory: request.working_directory.clone(),
                measures: request.measures.clone(),
            };
            let store = Arc::clone(&self.store);
            if let Err(e) = guarded(async move { store.create_evaluator(evaluator).await }).await {
                let message = format!("failed to create evaluator for {split} dataset: {e}");
                return Err(split_failure(created, format!("{split}.evaluator"), message));
            }
            METRICS.inc_created();
            obs::emit_entity_created("evaluator", split.as_str());
        }

        info!(committed = created.len(), "Dataset bundle provisioned");
        Ok(Provisioned {
            created,
            message: format!("Created dataset {}", request.id_prefix),
        })
    }
}

/// Classify a stopped bundle: nothing committed is a plain creation failure.
fn split_failure(created: Vec<String>, stage: String, message: String) -> AdminError {
    if created.is_empty() {
        return AdminError::Creation { stage, message };
    }
    METRICS.inc_partial();
    obs::emit_bundle_partial(&stage, created.len(), &message);
    AdminError::Partial {
        created,
        stage,
        message,
    }
}

/// Await a collaborator call, turning a panic into a backend error.
async fn guarded<T, F>(call: F) -> StorageResult<T>
where
    F: Future<Output = StorageResult<T>>,
{
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(StorageError::Backend(format!("collaborator panicked: {detail}")))
        }
    }
}
