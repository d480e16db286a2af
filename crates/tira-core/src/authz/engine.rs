//! Permission evaluation: role check, then ownership for restricted roles.

use serde::{Deserialize, Serialize};

use super::action::Action;
use super::policy::PolicyTable;
use super::role::{Actor, Role};

/// Why an authorization request was denied. Logged, never returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "clause", rename_all = "snake_case")]
pub enum DenialReason {
    /// The actor's role is not in the action's role set.
    RoleNotPermitted { role: Role },
    /// A restricted actor does not own the named resource.
    NotOwner { resource_id: String },
    /// A restricted actor called a resource-bound action without naming a resource.
    MissingResource,
    /// The action has no policy, or grants a restricted role without a resource binding.
    Misconfigured,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialReason::RoleNotPermitted { role } => write!(f, "role {role} not permitted"),
            DenialReason::NotOwner { resource_id } => {
                write!(f, "resource {resource_id} outside actor scope")
            }
            DenialReason::MissingResource => write!(f, "no resource named"),
            DenialReason::Misconfigured => write!(f, "action policy misconfigured"),
        }
    }
}

/// Outcome of evaluating an action against the policy table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Allowed,
    Denied(DenialReason),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed)
    }
}

/// Decides whether an actor may run an action.
#[derive(Debug, Clone, Default)]
pub struct PermissionEvaluator {
    table: PolicyTable,
}

impl PermissionEvaluator {
    pub fn new(table: PolicyTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    /// Evaluate `action` for `actor`, optionally naming the target resource.
    ///
    /// Clauses are checked in order: policy present, role membership, admin
    /// bypass, then (restricted roles only) resource binding and ownership.
    /// Anything not explicitly granted is denied.
    pub fn authorize(&self, actor: &Actor, action: Action, resource_id: Option<&str>) -> Verdict {
        let Some(policy) = self.table.get(action) else {
            return Verdict::Denied(DenialReason::Misconfigured);
        };

        if !policy.permits_role(actor.role) {
            return Verdict::Denied(DenialReason::RoleNotPermitted { role: actor.role });
        }

        if actor.role == Role::Admin || !actor.role.is_restricted() {
            return Verdict::Allowed;
        }

        if policy.resource.is_none() {
            return Verdict::Denied(DenialReason::Misconfigured);
        }

        match resource_id {
            None => Verdict::Denied(DenialReason::MissingResource),
            Some(id) if actor.owns(id) => Verdict::Allowed,
            Some(id) => Verdict::Denied(DenialReason::NotOwner {
                resource_id: id.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::policy::ActionPolicy;
    use tira_state::EntityKind;

    fn evaluator() -> PermissionEvaluator {
        PermissionEvaluator::new(PolicyTable::standard())
    }

    #[test]
    fn test_admin_allowed_everywhere() {
        let admin = Actor::new(Role::Admin);
        for action in Action::ALL {
            assert!(evaluator().authorize(&admin, action, Some("vm-1")).is_allowed());
        }
    }

    #[test]
    fn test_admin_bypasses_ownership() {
        let admin = Actor::new(Role::Admin);
        let v = evaluator().authorize(&admin, Action::CreateGroup, Some("vm-not-owned"));
        assert!(v.is_allowed());
    }

    #[test]
    fn test_anonymous_denied_by_role_clause() {
        let anon = Actor::anonymous();
        assert_eq!(
            evaluator().authorize(&anon, Action::ReloadData, None),
            Verdict::Denied(DenialReason::RoleNotPermitted {
                role: Role::Anonymous
            })
        );
    }

    #[test]
    fn test_organizer_owns_resource() {
        let org = Actor::new(Role::Organizer).with_scope(["vm-7"]);
        assert!(evaluator()
            .authorize(&org, Action::ReloadRuns, Some("vm-7"))
            .is_allowed());
    }

    #[test]
    fn test_organizer_foreign_resource_denied_by_ownership_clause() {
        let org = Actor::new(Role::Organizer).with_scope(["vm-7"]);
        assert_eq!(
            evaluator().authorize(&org, Action::CreateGroup, Some("vm-9")),
            Verdict::Denied(DenialReason::NotOwner {
                resource_id: "vm-9".into()
            })
        );
    }

    #[test]
    fn test_organizer_without_resource_denied() {
        let org = Actor::new(Role::Organizer).with_scope(["vm-7"]);
        assert_eq!(
            evaluator().authorize(&org, Action::ReloadRuns, None),
            Verdict::Denied(DenialReason::MissingResource)
        );
    }

    #[test]
    fn test_restricted_role_on_unbound_action_fails_closed() {
        let table = PolicyTable::empty().with_policy(
            Action::ReloadVms,
            ActionPolicy::roles(&[Role::Admin, Role::Organizer]),
        );
        let org = Actor::new(Role::Organizer).with_scope(["vm-7"]);
        assert_eq!(
            PermissionEvaluator::new(table).authorize(&org, Action::ReloadVms, Some("vm-7")),
            Verdict::Denied(DenialReason::Misconfigured)
        );
    }

    #[test]
    fn test_action_without_policy_denied() {
        let admin = Actor::new(Role::Admin);
        assert_eq!(
            PermissionEvaluator::new(PolicyTable::empty()).authorize(&admin, Action::CreateTask, None),
            Verdict::Denied(DenialReason::Misconfigured)
        );
    }

    #[test]
    fn test_unrestricted_role_in_bound_policy_skips_ownership() {
        let table = PolicyTable::empty().with_policy(
            Action::ReloadRuns,
            ActionPolicy::resource_bound(&[Role::User], EntityKind::Vm),
        );
        let user = Actor::new(Role::User);
        assert!(PermissionEvaluator::new(table)
            .authorize(&user, Action::ReloadRuns, Some("vm-1"))
            .is_allowed());
    }
}
