//! Collaborator trait definitions for TIRA administration
//!
//! These traits define the boundaries the admin core calls into:
//! - `EntityLookup`: resolve VM, task, organizer (and dataset) identifiers
//! - `ProvisioningStore`: create tasks, dataset splits, evaluators
//! - `ModelReloader`: refresh the cached platform model
//! - `GroupDirectory`: grant users access to a VM through a group
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::schema::{
    DatasetRecord, Entity, EntityKind, GroupInvite, NewDataset, NewEvaluator, NewTask, ReloadScope,
    TaskRecord, VmRecord,
};

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Entity resolution.
///
/// Guarantees:
/// - `lookup(kind, id)` returns an entity of `kind` or `StorageError::NotFound`.
/// - Any other error is a backend failure, not a statement about existence.
#[async_trait]
pub trait EntityLookup: Send + Sync {
    async fn lookup(&self, kind: EntityKind, id: &str) -> StorageResult<Entity>;

    /// Check whether an entity resolves. Backend failures are propagated.
    async fn exists(&self, kind: EntityKind, id: &str) -> StorageResult<bool> {
        match self.lookup(kind, id).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Entity creation.
///
/// The store is the final authority on success: it may reject a write that
/// passed every pre-check (`AlreadyExists` on a racing insert, `Rejected`
/// for malformed measures). Writes are not rolled back by the caller.
#[async_trait]
pub trait ProvisioningStore: Send + Sync {
    /// Create a task. Fails with `AlreadyExists` if `task_id` is taken.
    async fn create_task(&self, task: NewTask) -> StorageResult<TaskRecord>;

    /// Register a dataset split. The returned record carries the assigned
    /// `dataset_id` and the storage `path`.
    async fn create_dataset(&self, dataset: NewDataset) -> StorageResult<DatasetRecord>;

    /// Register the evaluator of the split named by `evaluator.dataset_id`.
    /// Fails with `NotFound` if that split was never registered.
    async fn create_evaluator(&self, evaluator: NewEvaluator) -> StorageResult<()>;
}

/// Cached model refresh.
#[async_trait]
pub trait ModelReloader: Send + Sync {
    async fn reload(&self, scope: ReloadScope) -> StorageResult<()>;
}

/// Access-group management for virtual machines.
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// Create an access group for `vm` and return an invite for it.
    async fn create_group(&self, vm: &VmRecord) -> StorageResult<GroupInvite>;
}
