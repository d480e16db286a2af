//! In-memory fakes for collaborator traits (testing only)
//!
//! `MemoryRegistry` satisfies every trait in `storage_traits` without any
//! external dependencies. It records each call in order so tests can assert
//! which collaborator calls were issued, and it can be scripted to fail or
//! panic on specific operations.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::error::StorageError;
use crate::schema::*;
use crate::storage_traits::*;

/// A collaborator call observed by [`MemoryRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Lookup { kind: EntityKind, id: String },
    CreateTask { task_id: String },
    CreateDataset { split: DatasetSplit },
    CreateEvaluator { split: DatasetSplit },
    Reload(ReloadScope),
    CreateGroup { vm_id: String },
}

/// Scripted failure for a create call.
#[derive(Debug, Clone)]
enum Fault {
    Error(StorageError),
    Panic(String),
}

#[derive(Debug, Default)]
struct Tables {
    vms: HashMap<String, VmRecord>,
    organizers: HashMap<String, OrganizerRecord>,
    tasks: HashMap<String, TaskRecord>,
    datasets: Vec<DatasetRecord>,
    evaluators: Vec<EvaluatorRecord>,
}

#[derive(Debug, Default)]
struct Faults {
    task: Option<Fault>,
    datasets: HashMap<DatasetSplit, Fault>,
    evaluators: HashMap<DatasetSplit, Fault>,
    reload: Option<Fault>,
    unavailable: HashSet<EntityKind>,
}

/// In-memory registry backed by `HashMap`s, with a call log.
#[derive(Debug)]
pub struct MemoryRegistry {
    tables: Mutex<Tables>,
    faults: Mutex<Faults>,
    calls: Mutex<Vec<StoreCall>>,
    date: NaiveDate,
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self {
            tables: Mutex::default(),
            faults: Mutex::default(),
            calls: Mutex::default(),
            date: Utc::now().date_naive(),
        }
    }
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the registration date used to derive dataset identifiers.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn with_vm(self, vm_id: &str) -> Self {
        self.tables
            .lock()
            .unwrap()
            .vms
            .insert(vm_id.to_string(), VmRecord::new(vm_id));
        self
    }

    pub fn with_organizer(self, organizer_id: &str) -> Self {
        self.tables
            .lock()
            .unwrap()
            .organizers
            .insert(organizer_id.to_string(), OrganizerRecord::new(organizer_id));
        self
    }

    /// Seed an existing task owned by `master_vm_id`.
    pub fn with_task(self, task_id: &str, master_vm_id: &str) -> Self {
        let task = TaskRecord {
            task_id: task_id.to_string(),
            name: task_id.to_string(),
            description: String::new(),
            master_vm_id: master_vm_id.to_string(),
            organizer_id: String::new(),
            website: String::new(),
            help_command: None,
            help_text: None,
        };
        self.tables
            .lock()
            .unwrap()
            .tasks
            .insert(task_id.to_string(), task);
        self
    }

    /// Make `create_task` fail with `err`.
    pub fn fail_task_create(self, err: StorageError) -> Self {
        self.faults.lock().unwrap().task = Some(Fault::Error(err));
        self
    }

    /// Make `create_dataset` fail for `split`.
    pub fn fail_dataset(self, split: DatasetSplit, err: StorageError) -> Self {
        self.faults
            .lock()
            .unwrap()
            .datasets
            .insert(split, Fault::Error(err));
        self
    }

    /// Make `create_dataset` panic for `split`.
    pub fn panic_on_dataset(self, split: DatasetSplit, message: &str) -> Self {
        self.faults
            .lock()
            .unwrap()
            .datasets
            .insert(split, Fault::Panic(message.to_string()));
        self
    }

    /// Make `create_evaluator` fail for `split`.
    pub fn fail_evaluator(self, split: DatasetSplit, err: StorageError) -> Self {
        self.faults
            .lock()
            .unwrap()
            .evaluators
            .insert(split, Fault::Error(err));
        self
    }

    /// Make `reload` fail with `err`.
    pub fn fail_reload(self, err: StorageError) -> Self {
        self.faults.lock().unwrap().reload = Some(Fault::Error(err));
        self
    }

    /// Make every lookup of `kind` fail with a backend error.
    pub fn unavailable(self, kind: EntityKind) -> Self {
        self.faults.lock().unwrap().unavailable.insert(kind);
        self
    }

    /// All collaborator calls observed so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of create calls (task, dataset, evaluator) observed so far.
    pub fn create_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    StoreCall::CreateTask { .. }
                        | StoreCall::CreateDataset { .. }
                        | StoreCall::CreateEvaluator { .. }
                )
            })
            .count()
    }

    pub fn tasks(&self) -> Vec<TaskRecord> {
        self.tables.lock().unwrap().tasks.values().cloned().collect()
    }

    pub fn datasets(&self) -> Vec<DatasetRecord> {
        self.tables.lock().unwrap().datasets.clone()
    }

    pub fn evaluators(&self) -> Vec<EvaluatorRecord> {
        self.tables.lock().unwrap().evaluators.clone()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }

    /// Apply a scripted fault. The faults lock is released before panicking.
    fn check(fault: Option<Fault>) -> StorageResult<()> {
        match fault {
            None => Ok(()),
            Some(Fault::Error(err)) => Err(err),
            Some(Fault::Panic(message)) => panic!("{message}"),
        }
    }
}

#[async_trait]
impl EntityLookup for MemoryRegistry {
    async fn lookup(&self, kind: EntityKind, id: &str) -> StorageResult<Entity> {
        self.record(StoreCall::Lookup {
            kind,
            id: id.to_string(),
        });
        if self.faults.lock().unwrap().unavailable.contains(&kind) {
            return Err(StorageError::Backend(format!("{} table unavailable", kind)));
        }

        let tables = self.tables.lock().unwrap();
        let found = match kind {
            EntityKind::Vm => tables.vms.get(id).cloned().map(Entity::Vm),
            EntityKind::Task => tables.tasks.get(id).cloned().map(Entity::Task),
            EntityKind::Organizer => tables.organizers.get(id).cloned().map(Entity::Organizer),
            EntityKind::Dataset => tables
                .datasets
                .iter()
                .find(|d| d.dataset_id == id)
                .cloned()
                .map(Entity::Dataset),
        };
        found.ok_or_else(|| StorageError::NotFound {
            kind,
            id: id.to_string(),
        })
    }
}

#[async_trait]
impl ProvisioningStore for MemoryRegistry {
    async fn create_task(&self, task: NewTask) -> StorageResult<TaskRecord> {
        self.record(StoreCall::CreateTask {
            task_id: task.task_id.clone(),
        });
        let fault = self.faults.lock().unwrap().task.clone();
        Self::check(fault)?;

        let mut tables = self.tables.lock().unwrap();
        if tables.tasks.contains_key(&task.task_id) {
            return Err(StorageError::AlreadyExists {
                kind: EntityKind::Task,
                id: task.task_id,
            });
        }
        tables.tasks.insert(task.task_id.clone(), task.clone());
        Ok(task)
    }

    async fn create_dataset(&self, dataset: NewDataset) -> StorageResult<DatasetRecord> {
        self.record(StoreCall::CreateDataset {
            split: dataset.split,
        });
        let fault = self.faults.lock().unwrap().datasets.get(&dataset.split).cloned();
        Self::check(fault)?;

        let record = DatasetRecord::from_new(dataset, self.date);
        let mut tables = self.tables.lock().unwrap();
        if tables
            .datasets
            .iter()
            .any(|d| d.dataset_id == record.dataset_id)
        {
            return Err(StorageError::AlreadyExists {
                kind: EntityKind::Dataset,
                id: record.dataset_id,
            });
        }
        tables.datasets.push(record.clone());
        Ok(record)
    }

    async fn create_evaluator(&self, evaluator: NewEvaluator) -> StorageResult<()> {
        self.record(StoreCall::CreateEvaluator {
            split: evaluator.split,
        });
        let fault = self
            .faults
            .lock()
            .unwrap()
            .evaluators
            .get(&evaluator.split)
            .cloned();
        Self::check(fault)?;

        if evaluator.measures.iter().any(MeasureSpec::is_empty) {
            return Err(StorageError::Rejected(
                "measure specification must not be empty".to_string(),
            ));
        }
        let mut tables = self.tables.lock().unwrap();
        if !tables
            .datasets
            .iter()
            .any(|d| d.dataset_id == evaluator.dataset_id)
        {
            return Err(StorageError::NotFound {
                kind: EntityKind::Dataset,
                id: evaluator.dataset_id,
            });
        }
        tables.evaluators.push(EvaluatorRecord::from_new(evaluator));
        Ok(())
    }
}

#[async_trait]
impl ModelReloader for MemoryRegistry {
    async fn reload(&self, scope: ReloadScope) -> StorageResult<()> {
        self.record(StoreCall::Reload(scope));
        let fault = self.faults.lock().unwrap().reload.clone();
        Self::check(fault)
    }
}

#[async_trait]
impl GroupDirectory for MemoryRegistry {
    async fn create_group(&self, vm: &VmRecord) -> StorageResult<GroupInvite> {
        self.record(StoreCall::CreateGroup {
            vm_id: vm.vm_id.clone(),
        });
        Ok(GroupInvite {
            group_name: format!("tira_vm_{}", vm.user_name),
            invite_link: format!("https://tira.example/invites/{}", vm.vm_id),
        })
    }
}
