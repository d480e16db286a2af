//! Entity records for the TIRA admin store
//!
//! Tables:
//! - vms: Virtual machines (master VMs host evaluators)
//! - organizers: Shared-task organizers
//! - tasks: Shared tasks
//! - datasets: Dataset splits registered for a task
//! - evaluators: Evaluator registrations bound 1:1 to a dataset split

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kinds of entity the lookup collaborator resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Vm,
    Task,
    Organizer,
    Dataset,
}

impl EntityKind {
    /// SurrealDB table holding this kind.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Vm => "vms",
            EntityKind::Task => "tasks",
            EntityKind::Organizer => "organizers",
            EntityKind::Dataset => "datasets",
        }
    }

    /// Name of the identifier column in [`EntityKind::table`].
    pub fn id_field(&self) -> &'static str {
        match self {
            EntityKind::Vm => "vm_id",
            EntityKind::Task => "task_id",
            EntityKind::Organizer => "organizer_id",
            EntityKind::Dataset => "dataset_id",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntityKind::Vm => "vm",
            EntityKind::Task => "task",
            EntityKind::Organizer => "organizer",
            EntityKind::Dataset => "dataset",
        };
        write!(f, "{s}")
    }
}

/// A virtual machine known to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmRecord {
    pub vm_id: String,
    pub host: String,
    pub user_name: String,
    pub port_ssh: Option<u16>,
    pub port_rdp: Option<u16>,
}

impl VmRecord {
    /// A VM record with only its identifier set; the VM id doubles as user name.
    pub fn new(vm_id: impl Into<String>) -> Self {
        let vm_id = vm_id.into();
        Self {
            user_name: vm_id.clone(),
            vm_id,
            host: String::new(),
            port_ssh: None,
            port_rdp: None,
        }
    }
}

/// A shared-task organizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizerRecord {
    pub organizer_id: String,
    pub name: String,
    pub website: Option<String>,
}

impl OrganizerRecord {
    pub fn new(organizer_id: impl Into<String>) -> Self {
        let organizer_id = organizer_id.into();
        Self {
            name: organizer_id.clone(),
            organizer_id,
            website: None,
        }
    }
}

/// A shared task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: String,
    pub name: String,
    pub description: String,
    pub master_vm_id: String,
    pub organizer_id: String,
    pub website: String,
    pub help_command: Option<String>,
    pub help_text: Option<String>,
}

/// Fields of a task to be created. Identical in shape to [`TaskRecord`].
pub type NewTask = TaskRecord;

/// Dataset split. [`DatasetSplit::ORDER`] is the processing order for bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetSplit {
    Training,
    Test,
    Dev,
}

impl DatasetSplit {
    pub const ORDER: [DatasetSplit; 3] = [DatasetSplit::Training, DatasetSplit::Test, DatasetSplit::Dev];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetSplit::Training => "training",
            DatasetSplit::Test => "test",
            DatasetSplit::Dev => "dev",
        }
    }

    /// Top-level data directory the split is stored under. Dev data lives
    /// alongside the training data.
    pub fn data_root(&self) -> &'static str {
        match self {
            DatasetSplit::Training | DatasetSplit::Dev => "training-datasets",
            DatasetSplit::Test => "test-datasets",
        }
    }
}

impl std::fmt::Display for DatasetSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build a dataset identifier: `{prefix}-{YYYYMMDD}-{split}`.
pub fn dataset_id(id_prefix: &str, split: DatasetSplit, date: NaiveDate) -> String {
    format!("{}-{}-{}", id_prefix, date.format("%Y%m%d"), split)
}

/// Build the storage path of a dataset split.
pub fn dataset_path(task_id: &str, dataset_id: &str, split: DatasetSplit) -> String {
    format!("{}/{}/{}", split.data_root(), task_id, dataset_id)
}

/// Request to register one dataset split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDataset {
    pub task_id: String,
    pub id_prefix: String,
    pub split: DatasetSplit,
    pub display_name: String,
}

/// A registered dataset split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub dataset_id: String,
    pub task_id: String,
    pub id_prefix: String,
    pub split: DatasetSplit,
    pub display_name: String,
    pub path: String,
}

impl DatasetRecord {
    /// Materialize a [`NewDataset`] as registered on `date`.
    pub fn from_new(new: NewDataset, date: NaiveDate) -> Self {
        let dataset_id = dataset_id(&new.id_prefix, new.split, date);
        let path = dataset_path(&new.task_id, &dataset_id, new.split);
        Self {
            dataset_id,
            task_id: new.task_id,
            id_prefix: new.id_prefix,
            split: new.split,
            display_name: new.display_name,
            path,
        }
    }
}

/// One measure line: ordered comma-separated fields (e.g. name, key).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasureSpec(pub Vec<String>);

impl MeasureSpec {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }
}

/// Request to register the evaluator of one dataset split.
///
/// `dataset_id` is the id the store assigned when the split was registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvaluator {
    pub master_vm_id: String,
    pub task_id: String,
    pub dataset_id: String,
    pub split: DatasetSplit,
    pub command: String,
    pub working_directory: String,
    pub measures: Vec<MeasureSpec>,
}

/// A registered evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorRecord {
    pub evaluator_id: String,
    pub dataset_id: String,
    pub task_id: String,
    pub master_vm_id: String,
    pub command: String,
    pub working_directory: String,
    pub measures: Vec<MeasureSpec>,
}

impl EvaluatorRecord {
    pub fn from_new(new: NewEvaluator) -> Self {
        Self {
            evaluator_id: format!("{}-evaluator", new.dataset_id),
            dataset_id: new.dataset_id,
            task_id: new.task_id,
            master_vm_id: new.master_vm_id,
            command: new.command,
            working_directory: new.working_directory,
            measures: new.measures,
        }
    }
}

/// A resolved entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Vm(VmRecord),
    Task(TaskRecord),
    Organizer(OrganizerRecord),
    Dataset(DatasetRecord),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Vm(_) => EntityKind::Vm,
            Entity::Task(_) => EntityKind::Task,
            Entity::Organizer(_) => EntityKind::Organizer,
            Entity::Dataset(_) => EntityKind::Dataset,
        }
    }
}

/// Which part of the cached platform model a reload refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ReloadScope {
    All,
    Vms,
    Datasets,
    Tasks,
    Runs { vm_id: String },
    LegacyUsers,
}

/// Result of creating an access group for a VM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInvite {
    pub group_name: String,
    pub invite_link: String,
}
