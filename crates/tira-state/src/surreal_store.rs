//! SurrealDB-backed collaborator implementation
//!
//! `SurrealStore` implements every trait in `storage_traits` over a single
//! connection. Supports in-memory (`mem://`), local (`surrealkv://`) and
//! remote (`ws://`, `wss://`) endpoints through the `any` engine.

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info, instrument};

use crate::error::StorageError;
use crate::migrations;
use crate::schema::*;
use crate::storage_traits::*;

/// Connection settings for the admin store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Endpoint URL (e.g. "mem://", "surrealkv://.tira/db", "wss://host")
    pub url: String,
    /// Namespace (default: "tira")
    pub namespace: String,
    /// Database name (default: "main")
    pub database: String,
    /// Base URL invite links are issued under
    pub invite_base_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "mem://".to_string(),
            namespace: "tira".to_string(),
            database: "main".to_string(),
            invite_base_url: "https://www.tira.io/invites".to_string(),
        }
    }
}

impl StoreConfig {
    /// Overlay `TIRA_STORE_URL`, `TIRA_STORE_NAMESPACE` and
    /// `TIRA_STORE_DATABASE` onto `self`.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("TIRA_STORE_URL") {
            self.url = url;
        }
        if let Ok(namespace) = std::env::var("TIRA_STORE_NAMESPACE") {
            self.namespace = namespace;
        }
        if let Ok(database) = std::env::var("TIRA_STORE_DATABASE") {
            self.database = database;
        }
    }
}

/// SurrealDB-backed implementation of the admin collaborator traits.
#[derive(Clone)]
pub struct SurrealStore {
    db: Surreal<Any>,
    invite_base_url: String,
}

impl SurrealStore {
    /// Create an in-memory instance for testing.
    pub async fn in_memory() -> StorageResult<Self> {
        Self::connect(&StoreConfig::default()).await
    }

    /// Connect to `config.url`, select namespace/database and init the schema.
    #[instrument(skip(config), fields(url = %config.url, namespace = %config.namespace, database = %config.database))]
    pub async fn connect(config: &StoreConfig) -> StorageResult<Self> {
        if let Some(path) = config.url.strip_prefix("surrealkv://") {
            std::fs::create_dir_all(path).map_err(|e| {
                StorageError::Connection(format!(
                    "Failed to create database directory {}: {}",
                    path, e
                ))
            })?;
        }

        let db = surrealdb::engine::any::connect(config.url.as_str())
            .await
            .map_err(|e| {
                StorageError::Connection(format!("Failed to connect to {}: {}", config.url, e))
            })?;

        db.use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await
            .map_err(|e| {
                StorageError::Connection(format!("Failed to select namespace/database: {}", e))
            })?;

        migrations::init_schema(&db).await?;

        info!("SurrealStore connected and schema initialized");
        Ok(Self {
            db,
            invite_base_url: config.invite_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Register a VM (bootstrap write, not an admin action).
    pub async fn register_vm(&self, vm: VmRecord) -> StorageResult<()> {
        if self.exists(EntityKind::Vm, &vm.vm_id).await? {
            return Err(StorageError::AlreadyExists {
                kind: EntityKind::Vm,
                id: vm.vm_id,
            });
        }
        let _created: Option<VmRecord> = self.db.create("vms").content(vm).await?;
        Ok(())
    }

    /// Register an organizer (bootstrap write, not an admin action).
    pub async fn register_organizer(&self, organizer: OrganizerRecord) -> StorageResult<()> {
        if self
            .exists(EntityKind::Organizer, &organizer.organizer_id)
            .await?
        {
            return Err(StorageError::AlreadyExists {
                kind: EntityKind::Organizer,
                id: organizer.organizer_id,
            });
        }
        let _created: Option<OrganizerRecord> =
            self.db.create("organizers").content(organizer).await?;
        Ok(())
    }

    /// All dataset splits registered for `task_id`.
    pub async fn datasets_for_task(&self, task_id: &str) -> StorageResult<Vec<DatasetRecord>> {
        let mut res = self
            .db
            .query("SELECT * FROM datasets WHERE task_id = $task_id ORDER BY dataset_id")
            .bind(("task_id", task_id.to_string()))
            .await?;
        Ok(res.take(0)?)
    }

    /// All evaluators registered for `task_id`.
    pub async fn evaluators_for_task(&self, task_id: &str) -> StorageResult<Vec<EvaluatorRecord>> {
        let mut res = self
            .db
            .query("SELECT * FROM evaluators WHERE task_id = $task_id ORDER BY dataset_id")
            .bind(("task_id", task_id.to_string()))
            .await?;
        Ok(res.take(0)?)
    }

    // -- private helpers -----------------------------------------------------

    async fn fetch_one<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> StorageResult<T> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = $id LIMIT 1",
            kind.table(),
            kind.id_field()
        );
        let mut res = self.db.query(sql).bind(("id", id.to_string())).await?;
        let rows: Vec<T> = res.take(0)?;
        rows.into_iter().next().ok_or_else(|| StorageError::NotFound {
            kind,
            id: id.to_string(),
        })
    }

    /// Map a create failure, translating unique-index violations.
    fn create_error(kind: EntityKind, id: &str, err: surrealdb::Error) -> StorageError {
        let message = err.to_string();
        if message.contains("already contains") || message.contains("already exists") {
            StorageError::AlreadyExists {
                kind,
                id: id.to_string(),
            }
        } else {
            StorageError::Backend(message)
        }
    }
}

#[async_trait]
impl EntityLookup for SurrealStore {
    #[instrument(skip(self))]
    async fn lookup(&self, kind: EntityKind, id: &str) -> StorageResult<Entity> {
        debug!("Looking up entity");
        let entity = match kind {
            EntityKind::Vm => Entity::Vm(self.fetch_one(kind, id).await?),
            EntityKind::Task => Entity::Task(self.fetch_one(kind, id).await?),
            EntityKind::Organizer => Entity::Organizer(self.fetch_one(kind, id).await?),
            EntityKind::Dataset => Entity::Dataset(self.fetch_one(kind, id).await?),
        };
        Ok(entity)
    }
}

#[async_trait]
impl ProvisioningStore for SurrealStore {
    #[instrument(skip(self, task), fields(task_id = %task.task_id))]
    async fn create_task(&self, task: NewTask) -> StorageResult<TaskRecord> {
        if self.exists(EntityKind::Task, &task.task_id).await? {
            return Err(StorageError::AlreadyExists {
                kind: EntityKind::Task,
                id: task.task_id,
            });
        }

        let task_id = task.task_id.clone();
        let created: Option<TaskRecord> = self
            .db
            .create("tasks")
            .content(task)
            .await
            .map_err(|e| Self::create_error(EntityKind::Task, &task_id, e))?;

        info!("Task created");
        created.ok_or_else(|| StorageError::Backend(format!("Failed to create task {task_id}")))
    }

    #[instrument(skip(self, dataset), fields(task_id = %dataset.task_id, split = %dataset.split))]
    async fn create_dataset(&self, dataset: NewDataset) -> StorageResult<DatasetRecord> {
        let record = DatasetRecord::from_new(dataset, Utc::now().date_naive());
        let dataset_id = record.dataset_id.clone();

        let _created: Option<DatasetRecord> = self
            .db
            .create("datasets")
            .content(record.clone())
            .await
            .map_err(|e| Self::create_error(EntityKind::Dataset, &dataset_id, e))?;

        info!(dataset_id = %dataset_id, "Dataset split created");
        Ok(record)
    }

    #[instrument(skip(self, evaluator), fields(task_id = %evaluator.task_id, split = %evaluator.split))]
    async fn create_evaluator(&self, evaluator: NewEvaluator) -> StorageResult<()> {
        if evaluator.measures.iter().any(MeasureSpec::is_empty) {
            return Err(StorageError::Rejected(
                "measure specification must not be empty".to_string(),
            ));
        }

        if !self.exists(EntityKind::Dataset, &evaluator.dataset_id).await? {
            return Err(StorageError::NotFound {
                kind: EntityKind::Dataset,
                id: evaluator.dataset_id,
            });
        }

        let record = EvaluatorRecord::from_new(evaluator);
        let dataset_id = record.dataset_id.clone();
        let _created: Option<EvaluatorRecord> = self
            .db
            .create("evaluators")
            .content(record)
            .await
            .map_err(|e| Self::create_error(EntityKind::Dataset, &dataset_id, e))?;

        info!(dataset_id = %dataset_id, "Evaluator created");
        Ok(())
    }
}

#[async_trait]
impl ModelReloader for SurrealStore {
    /// The store is read live, so a reload only verifies the connection.
    #[instrument(skip(self))]
    async fn reload(&self, scope: ReloadScope) -> StorageResult<()> {
        self.db
            .health()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        debug!(?scope, "Reload acknowledged");
        Ok(())
    }
}

#[async_trait]
impl GroupDirectory for SurrealStore {
    #[instrument(skip(self, vm), fields(vm_id = %vm.vm_id))]
    async fn create_group(&self, vm: &VmRecord) -> StorageResult<GroupInvite> {
        let group_name = format!("tira_vm_{}", vm.user_name);
        let invite = GroupInvite {
            invite_link: format!("{}/{}", self.invite_base_url, group_name),
            group_name: group_name.clone(),
        };

        let _created: Option<GroupInvite> = self
            .db
            .create("vm_groups")
            .content(invite.clone())
            .await
            .map_err(|e| Self::create_error(EntityKind::Vm, &vm.vm_id, e))?;

        info!(group = %group_name, "VM group created");
        Ok(invite)
    }
}
