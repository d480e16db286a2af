//! TIRA-State: collaborator layer for TIRA administration
//!
//! This crate holds everything the admin core calls into but does not own:
//! entity records, the lookup/persistence traits, in-memory fakes, and a
//! SurrealDB-backed store implementing every trait.
//!
//! ## Key Components
//!
//! - `storage_traits`: `EntityLookup`, `ProvisioningStore`, `ModelReloader`, `GroupDirectory`
//! - `schema`: `TaskRecord`, `DatasetRecord`, `EvaluatorRecord`, `DatasetSplit`, ...
//! - `SurrealStore`: reference backend (`mem://`, `surrealkv://`, `ws(s)://`)
//! - `fakes::MemoryRegistry`: scripted in-memory collaborator with a call log

mod error;
pub mod fakes;
pub mod migrations;
pub mod schema;
pub mod storage_traits;
pub mod surreal_store;

pub use error::StorageError;
pub use schema::{
    dataset_id, dataset_path, DatasetRecord, DatasetSplit, Entity, EntityKind, EvaluatorRecord,
    GroupInvite, MeasureSpec, NewDataset, NewEvaluator, NewTask, OrganizerRecord, ReloadScope,
    TaskRecord, VmRecord,
};
pub use storage_traits::{
    EntityLookup, GroupDirectory, ModelReloader, ProvisioningStore, StorageResult,
};
pub use surreal_store::{StoreConfig, SurrealStore};
