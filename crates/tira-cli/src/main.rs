//! TIRA Admin CLI
//!
//! The `tira-admin` command runs administrative actions against a TIRA
//! store and prints the result envelope as JSON.
//!
//! ## Commands
//!
//! - `reload`: Refresh part of the cached platform model
//! - `reload-runs`: Refresh the runs of one VM
//! - `create-task`: Create a task from a JSON form
//! - `add-dataset`: Create a dataset bundle from a JSON form
//! - `create-group`: Create an access group and invite link for a VM
//! - `seed`: Register VMs and organizers (bootstrap)
//! - `dispatch`: Run a raw tagged request

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tira_core::authz::{Actor, Role};
use tira_core::{
    AddDatasetForm, AdminConfig, AdminRequest, AdminService, CreateTaskForm, ResultEnvelope,
    METRICS,
};
use tira_state::{OrganizerRecord, SurrealStore, VmRecord};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "tira-admin")]
#[command(author = "TIRA Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Administration for the TIRA evaluation platform", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "TIRA_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Role to act as
    #[arg(long, global = true, default_value = "admin")]
    role: Role,

    /// Resource owned by the acting user (repeatable)
    #[arg(long = "scope", global = true)]
    scope: Vec<String>,

    /// Acting user id
    #[arg(long = "user", global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh part of the cached platform model
    Reload {
        #[arg(value_enum)]
        target: ReloadTarget,
    },

    /// Refresh the runs of one VM
    ReloadRuns {
        #[arg(long)]
        vm: String,
    },

    /// Create a task from a JSON form
    CreateTask {
        /// Path to the task form (JSON)
        #[arg(short, long)]
        payload: PathBuf,
    },

    /// Create dataset splits and their evaluators from a JSON form
    AddDataset {
        /// Path to the dataset form (JSON)
        #[arg(short, long)]
        payload: PathBuf,
    },

    /// Create an access group and invite link for a VM
    CreateGroup {
        #[arg(long)]
        vm: String,
    },

    /// Register VMs and organizers from a JSON file
    Seed {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Run a raw request (`{"action": "...", ...}`)
    Dispatch {
        #[arg(short, long)]
        payload: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReloadTarget {
    Data,
    Vms,
    Datasets,
    Tasks,
}

/// Bootstrap records accepted by `seed`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SeedFile {
    vms: Vec<VmRecord>,
    organizers: Vec<OrganizerRecord>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AdminConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AdminConfig::from_env().context("Invalid TIRA_* environment")?,
    };
    if cli.verbose {
        config.logging.level = Level::DEBUG.to_string();
    }
    if cli.json {
        config.logging.json = true;
    }
    tira_core::init_from_config(&config.logging);

    let store = Arc::new(
        SurrealStore::connect(&config.store)
            .await
            .context("Failed to connect to TIRA store")?,
    );

    let code = match cli.command {
        Commands::Seed { file } => {
            cmd_seed(&store, &file).await?;
            ExitCode::SUCCESS
        }
        command => {
            let request = build_request(command)?;
            let actor = actor_from(cli.role, cli.scope, cli.user);
            let service =
                AdminService::from_registry(store).with_deployment(config.deployment);
            let envelope = service.dispatch(&actor, request).await;
            print_envelope(&envelope)?
        }
    };

    METRICS.flush();
    Ok(code)
}

fn actor_from(role: Role, scope: Vec<String>, user: Option<String>) -> Actor {
    let actor = Actor::new(role).with_scope(scope);
    match user {
        Some(user) => actor.with_user(user),
        None => actor,
    }
}

/// Translate a subcommand into the request it dispatches.
fn build_request(command: Commands) -> Result<AdminRequest> {
    let request = match command {
        Commands::Reload { target } => match target {
            ReloadTarget::Data => AdminRequest::ReloadData,
            ReloadTarget::Vms => AdminRequest::ReloadVms,
            ReloadTarget::Datasets => AdminRequest::ReloadDatasets,
            ReloadTarget::Tasks => AdminRequest::ReloadTasks,
        },
        Commands::ReloadRuns { vm } => AdminRequest::ReloadRuns { vm_id: vm },
        Commands::CreateTask { payload } => {
            AdminRequest::CreateTask(read_json::<CreateTaskForm>(&payload)?)
        }
        Commands::AddDataset { payload } => {
            AdminRequest::AddDataset(read_json::<AddDatasetForm>(&payload)?)
        }
        Commands::CreateGroup { vm } => AdminRequest::CreateGroup { vm_id: vm },
        Commands::Dispatch { payload } => read_json::<AdminRequest>(&payload)?,
        Commands::Seed { .. } => anyhow::bail!("seed is not an admin action"),
    };
    Ok(request)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn print_envelope(envelope: &ResultEnvelope) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(envelope)?);
    Ok(if envelope.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Register the VMs and organizers listed in `file`.
async fn cmd_seed(store: &SurrealStore, file: &Path) -> Result<()> {
    let seed: SeedFile = read_json(file)?;
    let (vms, organizers) = (seed.vms.len(), seed.organizers.len());

    for vm in seed.vms {
        let vm_id = vm.vm_id.clone();
        store
            .register_vm(vm)
            .await
            .with_context(|| format!("Failed to register VM {vm_id}"))?;
    }
    for organizer in seed.organizers {
        let organizer_id = organizer.organizer_id.clone();
        store
            .register_organizer(organizer)
            .await
            .with_context(|| format!("Failed to register organizer {organizer_id}"))?;
    }

    info!(vms, organizers, "Seed applied");
    println!("Registered {vms} VMs and {organizers} organizers");
    Ok(())
}
