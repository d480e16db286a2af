//! SurrealDB schema initialization
//!
//! Sets up every admin table with unique identifier indexes. Uses
//! `IF NOT EXISTS` so it is safe to call on every connection.

use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::storage_traits::StorageResult;

/// Initialize all TIRA admin tables.
pub async fn init_schema(db: &Surreal<Any>) -> StorageResult<()> {
    info!("Initializing TIRA admin schema");

    init_table(db, "vms", VMS).await?;
    init_table(db, "organizers", ORGANIZERS).await?;
    init_table(db, "tasks", TASKS).await?;
    init_table(db, "datasets", DATASETS).await?;
    init_table(db, "evaluators", EVALUATORS).await?;
    init_table(db, "vm_groups", VM_GROUPS).await?;

    info!("TIRA admin schema initialization complete");
    Ok(())
}

async fn init_table(db: &Surreal<Any>, table: &str, sql: &str) -> StorageResult<()> {
    debug!(table, "Initializing table");
    db.query(sql)
        .await
        .map_err(|e| StorageError::SchemaSetup(format!("{table}: {e}")))?;
    Ok(())
}

const VMS: &str = r#"
    DEFINE TABLE IF NOT EXISTS vms SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS vm_id ON vms TYPE string;
    DEFINE FIELD IF NOT EXISTS host ON vms TYPE string;
    DEFINE FIELD IF NOT EXISTS user_name ON vms TYPE string;
    DEFINE FIELD IF NOT EXISTS port_ssh ON vms TYPE option<int>;
    DEFINE FIELD IF NOT EXISTS port_rdp ON vms TYPE option<int>;
    DEFINE INDEX IF NOT EXISTS idx_vm_id ON vms FIELDS vm_id UNIQUE;
"#;

const ORGANIZERS: &str = r#"
    DEFINE TABLE IF NOT EXISTS organizers SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS organizer_id ON organizers TYPE string;
    DEFINE FIELD IF NOT EXISTS name ON organizers TYPE string;
    DEFINE FIELD IF NOT EXISTS website ON organizers TYPE option<string>;
    DEFINE INDEX IF NOT EXISTS idx_organizer_id ON organizers FIELDS organizer_id UNIQUE;
"#;

const TASKS: &str = r#"
    DEFINE TABLE IF NOT EXISTS tasks SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS task_id ON tasks TYPE string;
    DEFINE FIELD IF NOT EXISTS name ON tasks TYPE string;
    DEFINE FIELD IF NOT EXISTS description ON tasks TYPE string;
    DEFINE FIELD IF NOT EXISTS master_vm_id ON tasks TYPE string;
    DEFINE FIELD IF NOT EXISTS organizer_id ON tasks TYPE string;
    DEFINE FIELD IF NOT EXISTS website ON tasks TYPE string;
    DEFINE FIELD IF NOT EXISTS help_command ON tasks TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS help_text ON tasks TYPE option<string>;
    DEFINE INDEX IF NOT EXISTS idx_task_id ON tasks FIELDS task_id UNIQUE;
"#;

const DATASETS: &str = r#"
    DEFINE TABLE IF NOT EXISTS datasets SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS dataset_id ON datasets TYPE string;
    DEFINE FIELD IF NOT EXISTS task_id ON datasets TYPE string;
    DEFINE FIELD IF NOT EXISTS id_prefix ON datasets TYPE string;
    DEFINE FIELD IF NOT EXISTS split ON datasets TYPE string ASSERT $value IN ["training", "test", "dev"];
    DEFINE FIELD IF NOT EXISTS display_name ON datasets TYPE string;
    DEFINE FIELD IF NOT EXISTS path ON datasets TYPE string;
    DEFINE INDEX IF NOT EXISTS idx_dataset_id ON datasets FIELDS dataset_id UNIQUE;
    DEFINE INDEX IF NOT EXISTS idx_dataset_task ON datasets FIELDS task_id;
"#;

const EVALUATORS: &str = r#"
    DEFINE TABLE IF NOT EXISTS evaluators SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS evaluator_id ON evaluators TYPE string;
    DEFINE FIELD IF NOT EXISTS dataset_id ON evaluators TYPE string;
    DEFINE FIELD IF NOT EXISTS task_id ON evaluators TYPE string;
    DEFINE FIELD IF NOT EXISTS master_vm_id ON evaluators TYPE string;
    DEFINE FIELD IF NOT EXISTS command ON evaluators TYPE string;
    DEFINE FIELD IF NOT EXISTS working_directory ON evaluators TYPE string;
    DEFINE FIELD IF NOT EXISTS measures ON evaluators TYPE array<array<string>>;
    DEFINE INDEX IF NOT EXISTS idx_evaluator_dataset ON evaluators FIELDS dataset_id UNIQUE;
"#;

const VM_GROUPS: &str = r#"
    DEFINE TABLE IF NOT EXISTS vm_groups SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS group_name ON vm_groups TYPE string;
    DEFINE FIELD IF NOT EXISTS invite_link ON vm_groups TYPE string;
    DEFINE INDEX IF NOT EXISTS idx_group_name ON vm_groups FIELDS group_name UNIQUE;
"#;
