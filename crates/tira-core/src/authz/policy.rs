//! Permission predicates and the action → policy table.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tira_state::EntityKind;

use super::action::Action;
use super::role::Role;

/// The permission predicate of one action.
///
/// Without `resource` the predicate is `{role-set}`; with it, it is
/// `{role-set, resource-bound}` and restricted roles must own the resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPolicy {
    pub allowed_roles: BTreeSet<Role>,
    #[serde(default)]
    pub resource: Option<EntityKind>,
}

impl ActionPolicy {
    /// Unconditional policy: membership in `roles` is sufficient.
    pub fn roles(roles: &[Role]) -> Self {
        Self {
            allowed_roles: roles.iter().copied().collect(),
            resource: None,
        }
    }

    /// Resource-bound policy: restricted roles must own the `kind` resource.
    pub fn resource_bound(roles: &[Role], kind: EntityKind) -> Self {
        Self {
            allowed_roles: roles.iter().copied().collect(),
            resource: Some(kind),
        }
    }

    pub fn permits_role(&self, role: Role) -> bool {
        self.allowed_roles.contains(&role)
    }
}

/// Policies keyed by action. Actions without an entry are denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTable {
    pub policies: BTreeMap<Action, ActionPolicy>,
}

impl PolicyTable {
    /// An empty table (every action denied).
    pub fn empty() -> Self {
        Self {
            policies: BTreeMap::new(),
        }
    }

    /// Set the policy of `action` and return `self` (builder pattern).
    pub fn with_policy(mut self, action: Action, policy: ActionPolicy) -> Self {
        self.policies.insert(action, policy);
        self
    }

    pub fn get(&self, action: Action) -> Option<&ActionPolicy> {
        self.policies.get(&action)
    }

    /// The platform's standard admin policy.
    ///
    /// | Action          | Admin | Organizer        | Resource |
    /// |-----------------|-------|------------------|----------|
    /// | reload-data     |   ✓   |        ✗         |    –     |
    /// | reload-vms      |   ✓   |        ✗         |    –     |
    /// | reload-datasets |   ✓   |        ✗         |    –     |
    /// | reload-tasks    |   ✓   |        ✗         |    –     |
    /// | reload-runs     |   ✓   | ✓ (owned VM)     |    VM    |
    /// | create-task     |   ✓   |        ✗         |    –     |
    /// | add-dataset     |   ✓   |        ✗         |    –     |
    /// | create-group    |   ✓   | ✓ (owned VM)     |    VM    |
    pub fn standard() -> Self {
        let admin_only = ActionPolicy::roles(&[Role::Admin]);
        let vm_bound = ActionPolicy::resource_bound(&[Role::Admin, Role::Organizer], EntityKind::Vm);

        let mut table = Self::empty();
        for action in [
            Action::ReloadData,
            Action::ReloadVms,
            Action::ReloadDatasets,
            Action::ReloadTasks,
            Action::CreateTask,
            Action::AddDataset,
        ] {
            table = table.with_policy(action, admin_only.clone());
        }
        table
            .with_policy(Action::ReloadRuns, vm_bound.clone())
            .with_policy(Action::CreateGroup, vm_bound)
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::standard()
    }
}
