//! Admin-level error taxonomy.

use tira_state::{EntityKind, StorageError};

/// Errors produced while authorizing, validating or executing an admin action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdminError {
    /// The caller may not run the action. Carries no detail:
    /// the reason is logged, never returned.
    #[error("permission denied")]
    AuthorizationDenied,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A referenced entity does not resolve.
    #[error("{label} does not exist: {id}")]
    Referential {
        kind: EntityKind,
        label: &'static str,
        id: String,
    },

    /// The entity to be created already exists.
    #[error("{kind} already exists: {id}")]
    Conflict { kind: EntityKind, id: String },

    /// The persistence collaborator rejected a create call.
    #[error("{message}")]
    Creation { stage: String, message: String },

    /// A bundle stopped after committing some of its entities.
    #[error("{message}")]
    Partial {
        created: Vec<String>,
        stage: String,
        message: String,
    },

    /// A collaborator failed for a reason other than absence or rejection.
    #[error("{message}")]
    Store { stage: String, message: String },
}

impl AdminError {
    /// Stage the error is reported under in the result envelope.
    pub fn stage(&self) -> &str {
        match self {
            AdminError::AuthorizationDenied => "authorization",
            AdminError::InvalidRequest(_) => "validation",
            AdminError::Referential { .. } | AdminError::Conflict { .. } => "precheck",
            AdminError::Creation { stage, .. }
            | AdminError::Partial { stage, .. }
            | AdminError::Store { stage, .. } => stage,
        }
    }

    /// Map a lookup failure on a referenced entity.
    pub fn from_lookup(err: StorageError, label: &'static str) -> Self {
        match err {
            StorageError::NotFound { kind, id } => AdminError::Referential { kind, label, id },
            other => AdminError::Store {
                stage: "precheck".to_string(),
                message: format!("could not resolve {label}: {other}"),
            },
        }
    }
}

/// Result type for admin operations.
pub type AdminResult<T> = std::result::Result<T, AdminError>;
