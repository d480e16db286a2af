//! Named admin actions: the entry points permission policies attach to.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    ReloadData,
    ReloadVms,
    ReloadDatasets,
    ReloadTasks,
    ReloadRuns,
    CreateTask,
    AddDataset,
    CreateGroup,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::ReloadData,
        Action::ReloadVms,
        Action::ReloadDatasets,
        Action::ReloadTasks,
        Action::ReloadRuns,
        Action::CreateTask,
        Action::AddDataset,
        Action::CreateGroup,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Action::ReloadData => "reload-data",
            Action::ReloadVms => "reload-vms",
            Action::ReloadDatasets => "reload-datasets",
            Action::ReloadTasks => "reload-tasks",
            Action::ReloadRuns => "reload-runs",
            Action::CreateTask => "create-task",
            Action::AddDataset => "add-dataset",
            Action::CreateGroup => "create-group",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
