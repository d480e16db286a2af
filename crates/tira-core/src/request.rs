//! Admin request payloads and their validation into typed requests.
//!
//! Raw forms arrive as loosely-typed payloads (every field optional). The
//! pipeline validates them into `ValidatedRequest` before the orchestrator
//! sees them; the orchestrator never parses fields itself.

use serde::{Deserialize, Serialize};
use tira_state::{DatasetSplit, EntityKind, MeasureSpec};

use crate::authz::Action;
use crate::error::{AdminError, AdminResult};
use crate::provisioning::parse_measures;

/// Raw create-task form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateTaskForm {
    pub task_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "master_id")]
    pub master_vm_id: Option<String>,
    #[serde(alias = "organizer")]
    pub organizer_id: Option<String>,
    pub website: Option<String>,
    pub help_command: Option<String>,
    pub help_text: Option<String>,
}

/// Raw add-dataset form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddDatasetForm {
    pub dataset_id_prefix: Option<String>,
    pub dataset_name: Option<String>,
    pub master_vm_id: Option<String>,
    pub task_id: Option<String>,
    pub command: Option<String>,
    pub working_directory: Option<String>,
    pub measures: Option<String>,
    pub create_training: bool,
    pub create_test: bool,
    pub create_dev: bool,
}

/// An admin request as received by the dispatch layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum AdminRequest {
    ReloadData,
    ReloadVms,
    ReloadDatasets,
    ReloadTasks,
    ReloadRuns { vm_id: String },
    CreateTask(CreateTaskForm),
    AddDataset(AddDatasetForm),
    CreateGroup { vm_id: String },
}

impl AdminRequest {
    pub fn action(&self) -> Action {
        match self {
            AdminRequest::ReloadData => Action::ReloadData,
            AdminRequest::ReloadVms => Action::ReloadVms,
            AdminRequest::ReloadDatasets => Action::ReloadDatasets,
            AdminRequest::ReloadTasks => Action::ReloadTasks,
            AdminRequest::ReloadRuns { .. } => Action::ReloadRuns,
            AdminRequest::CreateTask(_) => Action::CreateTask,
            AdminRequest::AddDataset(_) => Action::AddDataset,
            AdminRequest::CreateGroup { .. } => Action::CreateGroup,
        }
    }

    /// The resource the request names, used for ownership checks.
    ///
    /// Normalized the same way validation normalizes it, so ownership is
    /// checked against the id the action will run on.
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            AdminRequest::ReloadRuns { vm_id } | AdminRequest::CreateGroup { vm_id } => {
                Some(normalized(vm_id))
            }
            _ => None,
        }
    }

    /// Validate the payload into a typed request.
    pub fn validate(self) -> AdminResult<ValidatedRequest> {
        let validated = match self {
            AdminRequest::ReloadData => ValidatedRequest::ReloadData,
            AdminRequest::ReloadVms => ValidatedRequest::ReloadVms,
            AdminRequest::ReloadDatasets => ValidatedRequest::ReloadDatasets,
            AdminRequest::ReloadTasks => ValidatedRequest::ReloadTasks,
            AdminRequest::ReloadRuns { vm_id } => ValidatedRequest::ReloadRuns {
                vm_id: identifier("vm_id", Some(vm_id))?,
            },
            AdminRequest::CreateTask(form) => ValidatedRequest::CreateTask(form.validate()?),
            AdminRequest::AddDataset(form) => ValidatedRequest::AddDataset(form.validate()?),
            AdminRequest::CreateGroup { vm_id } => ValidatedRequest::CreateGroup {
                vm_id: identifier("vm_id", Some(vm_id))?,
            },
        };
        Ok(validated)
    }
}

/// Validated create-task request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub task_id: String,
    pub name: String,
    pub description: String,
    pub master_vm_id: String,
    pub organizer_id: String,
    pub website: String,
    pub help_command: Option<String>,
    pub help_text: Option<String>,
}

/// Which dataset splits a bundle should create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitFlags {
    pub training: bool,
    pub test: bool,
    pub dev: bool,
}

impl SplitFlags {
    pub fn is_requested(&self, split: DatasetSplit) -> bool {
        match split {
            DatasetSplit::Training => self.training,
            DatasetSplit::Test => self.test,
            DatasetSplit::Dev => self.dev,
        }
    }

    /// Requested splits in processing order.
    pub fn requested(&self) -> impl Iterator<Item = DatasetSplit> + '_ {
        DatasetSplit::ORDER
            .into_iter()
            .filter(move |split| self.is_requested(*split))
    }

    pub fn any(&self) -> bool {
        self.training || self.test || self.dev
    }
}

/// Validated add-dataset (bundle) request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddDatasetRequest {
    pub task_id: String,
    pub id_prefix: String,
    pub display_name: String,
    pub master_vm_id: String,
    pub command: String,
    pub working_directory: String,
    pub measures: Vec<MeasureSpec>,
    pub splits: SplitFlags,
}

/// A request whose payload passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedRequest {
    ReloadData,
    ReloadVms,
    ReloadDatasets,
    ReloadTasks,
    ReloadRuns { vm_id: String },
    CreateTask(CreateTaskRequest),
    AddDataset(AddDatasetRequest),
    CreateGroup { vm_id: String },
}

impl ValidatedRequest {
    /// The existing resource that must resolve before execution, if any.
    pub fn guarded_resource(&self) -> Option<(EntityKind, &str)> {
        match self {
            ValidatedRequest::ReloadRuns { vm_id } | ValidatedRequest::CreateGroup { vm_id } => {
                Some((EntityKind::Vm, vm_id.as_str()))
            }
            _ => None,
        }
    }
}

impl CreateTaskForm {
    /// A missing or blank `name` falls back to the task id.
    pub fn validate(self) -> AdminResult<CreateTaskRequest> {
        let task_id = identifier("task_id", self.task_id)?;
        let name = optional(self.name)
            .map(|name| normalized(&name).to_string())
            .unwrap_or_else(|| task_id.clone());
        Ok(CreateTaskRequest {
            task_id,
            name,
            description: self.description.unwrap_or_default(),
            master_vm_id: identifier("master_vm_id", self.master_vm_id)?,
            organizer_id: identifier("organizer_id", self.organizer_id)?,
            website: self.website.unwrap_or_default().trim().to_string(),
            help_command: optional(self.help_command),
            help_text: optional(self.help_text),
        })
    }
}

impl AddDatasetForm {
    pub fn validate(self) -> AdminResult<AddDatasetRequest> {
        let splits = SplitFlags {
            training: self.create_training,
            test: self.create_test,
            dev: self.create_dev,
        };
        if !splits.any() {
            return Err(AdminError::InvalidRequest(
                "at least one of create_training, create_test, create_dev must be set".to_string(),
            ));
        }

        Ok(AddDatasetRequest {
            task_id: identifier("task_id", self.task_id)?,
            id_prefix: identifier("dataset_id_prefix", self.dataset_id_prefix)?,
            display_name: required("dataset_name", self.dataset_name)?,
            master_vm_id: identifier("master_vm_id", self.master_vm_id)?,
            command: required("command", self.command)?,
            working_directory: self.working_directory.unwrap_or_default(),
            measures: parse_measures(self.measures.as_deref().unwrap_or_default()),
            splits,
        })
    }
}

fn normalized(value: &str) -> &str {
    value.trim()
}

fn required(field: &str, value: Option<String>) -> AdminResult<String> {
    match value.as_deref().map(normalized) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AdminError::InvalidRequest(format!("{field} is required"))),
    }
}

/// A required value that is also used in identifiers and storage paths.
fn identifier(field: &str, value: Option<String>) -> AdminResult<String> {
    let value = required(field, value)?;
    if value.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(AdminError::InvalidRequest(format!(
            "{field} must not contain whitespace or '/': {value}"
        )));
    }
    Ok(value)
}

fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_form() -> CreateTaskForm {
        CreateTaskForm {
            task_id: Some("t1".into()),
            name: Some("Task One".into()),
            description: Some("desc".into()),
            master_vm_id: Some("vm-exists".into()),
            organizer_id: Some("org-exists".into()),
            website: Some(" https://example.org ".into()),
            help_command: Some("".into()),
            help_text: None,
        }
    }

    fn dataset_form() -> AddDatasetForm {
        AddDatasetForm {
            dataset_id_prefix: Some("ds".into()),
            dataset_name: Some("Dataset".into()),
            master_vm_id: Some("vm-exists".into()),
            task_id: Some("t1".into()),
            command: Some("eval.sh".into()),
            working_directory: None,
            measures: Some("F1,f1".into()),
            create_training: true,
            create_test: false,
            create_dev: true,
        }
    }

    #[test]
    fn test_create_task_form_validates() {
        let req = task_form().validate().unwrap();
        assert_eq!(req.task_id, "t1");
        assert_eq!(req.website, "https://example.org");
        assert_eq!(req.help_command, None);
    }

    #[test]
    fn test_create_task_name_defaults_to_task_id() {
        for name in [None, Some("   ".to_string())] {
            let form = CreateTaskForm {
                name,
                ..task_form()
            };
            assert_eq!(form.validate().unwrap().name, "t1");
        }
    }

    #[test]
    fn test_create_task_missing_task_id_rejected() {
        let form = CreateTaskForm {
            task_id: None,
            ..task_form()
        };
        match form.validate() {
            Err(AdminError::InvalidRequest(msg)) => assert!(msg.contains("task_id")),
            other => panic!("expected InvalidRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_resource_id_matches_validated_vm_id() {
        let request = AdminRequest::CreateGroup {
            vm_id: "  vm-7 ".into(),
        };
        assert_eq!(request.resource_id(), Some("vm-7"));
        match request.validate().unwrap() {
            ValidatedRequest::CreateGroup { vm_id } => assert_eq!(vm_id, "vm-7"),
            other => panic!("expected CreateGroup, got {:?}", other),
        }
    }

    #[test]
    fn test_task_id_with_slash_rejected() {
        let form = CreateTaskForm {
            task_id: Some("a/b".into()),
            ..task_form()
        };
        assert!(matches!(form.validate(), Err(AdminError::InvalidRequest(_))));
    }

    #[test]
    fn test_legacy_field_aliases() {
        let form: CreateTaskForm = serde_json::from_value(serde_json::json!({
            "task_id": "t1",
            "name": "T",
            "master_id": "vm-1",
            "organizer": "org-1",
        }))
        .unwrap();
        assert_eq!(form.master_vm_id.as_deref(), Some("vm-1"));
        assert_eq!(form.organizer_id.as_deref(), Some("org-1"));
    }

    #[test]
    fn test_add_dataset_requires_a_split() {
        let form = AddDatasetForm {
            create_training: false,
            create_dev: false,
            ..dataset_form()
        };
        assert!(matches!(form.validate(), Err(AdminError::InvalidRequest(_))));
    }

    #[test]
    fn test_split_flags_iterate_in_fixed_order() {
        let req = dataset_form().validate().unwrap();
        let splits: Vec<_> = req.splits.requested().collect();
        assert_eq!(splits, vec![DatasetSplit::Training, DatasetSplit::Dev]);
    }

    #[test]
    fn test_request_serde_tag() {
        let req: AdminRequest = serde_json::from_value(serde_json::json!({
            "action": "create-group",
            "vm_id": "vm-7",
        }))
        .unwrap();
        assert_eq!(req.action(), Action::CreateGroup);
        assert_eq!(req.resource_id(), Some("vm-7"));
    }

    #[test]
    fn test_guarded_resource_only_for_vm_bound_requests() {
        let group = AdminRequest::CreateGroup {
            vm_id: "vm-7".into(),
        }
        .validate()
        .unwrap();
        assert_eq!(group.guarded_resource(), Some((EntityKind::Vm, "vm-7")));
        assert_eq!(AdminRequest::ReloadVms.validate().unwrap().guarded_resource(), None);
    }
}
