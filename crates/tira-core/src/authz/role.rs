//! Caller identity: `Role`, `Actor`, and the `ActorSource` seam.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Roles a caller can hold.
///
/// `Admin` is the unrestricted tier and bypasses ownership checks.
/// `Organizer` is the restricted tier: it may only act on resources in its
/// own scope. It is also accepted under the platform's group name
/// `organizer-restricted-role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[serde(alias = "organizer-restricted-role")]
    Organizer,
    Participant,
    User,
    Anonymous,
}

impl Role {
    /// Returns `true` for roles whose access is bound to their resource scope.
    pub fn is_restricted(&self) -> bool {
        matches!(self, Role::Organizer)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Organizer => "organizer",
            Role::Participant => "participant",
            Role::User => "user",
            Role::Anonymous => "anonymous",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "organizer" | "organizer-restricted-role" => Ok(Role::Organizer),
            "participant" => Ok(Role::Participant),
            "user" => Ok(Role::User),
            "anonymous" => Ok(Role::Anonymous),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The authenticated caller of an admin action. Immutable for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Option<String>,
    pub role: Role,
    /// Identifiers of resources the actor owns (e.g. VM ids).
    #[serde(default)]
    pub resource_scope: BTreeSet<String>,
}

impl Actor {
    pub fn new(role: Role) -> Self {
        Self {
            user_id: None,
            role,
            resource_scope: BTreeSet::new(),
        }
    }

    pub fn anonymous() -> Self {
        Self::new(Role::Anonymous)
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Add resources to the actor's scope (builder pattern).
    pub fn with_scope<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource_scope
            .extend(resources.into_iter().map(Into::into));
        self
    }

    pub fn owns(&self, resource_id: &str) -> bool {
        self.resource_scope.contains(resource_id)
    }
}

/// Supplies the caller of the current request (the authentication collaborator).
pub trait ActorSource: Send + Sync {
    fn current_actor(&self) -> Actor;
}

/// An `ActorSource` that always yields the same actor.
#[derive(Debug, Clone)]
pub struct StaticActor(pub Actor);

impl ActorSource for StaticActor {
    fn current_actor(&self) -> Actor {
        self.0.clone()
    }
}
