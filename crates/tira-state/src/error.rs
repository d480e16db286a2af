//! Error types for tira-state

use thiserror::Error;

use crate::schema::EntityKind;

/// Errors returned by the entity lookup and persistence collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The referenced entity does not resolve
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// An entity with the same identifier is already stored
    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: EntityKind, id: String },

    /// The store refused the write (malformed payload, constraint violation)
    #[error("rejected by store: {0}")]
    Rejected(String),

    /// Backend query or transport failure
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),
}

impl StorageError {
    /// Returns `true` for [`StorageError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

impl From<surrealdb::Error> for StorageError {
    fn from(err: surrealdb::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display_names_kind_and_id() {
        let err = StorageError::NotFound {
            kind: EntityKind::Organizer,
            id: "org-x".into(),
        };
        assert_eq!(err.to_string(), "organizer not found: org-x");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_rejected_is_not_not_found() {
        let err = StorageError::Rejected("empty measure".into());
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("empty measure"));
    }
}
