//! Result envelope returned by every admin action.

use serde::{Deserialize, Serialize};

use crate::error::{AdminError, AdminResult};

// ── envelope schema ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Fail,
    Partial,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Fail => "fail",
            Status::Partial => "partial",
        }
    }
}

/// One error attributed to the stage that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageError {
    pub stage: String,
    pub message: String,
}

/// Outcome of an admin action as seen by the caller.
///
/// `created` lists committed identifiers or paths in creation order and is
/// non-empty only for `success` and `partial`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub status: Status,
    pub created: Vec<String>,
    pub errors: Vec<StageError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ResultEnvelope {
    pub fn success(created: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            created,
            errors: Vec::new(),
            message: Some(message.into()),
        }
    }

    /// The single envelope returned for every authorization denial.
    pub fn forbidden() -> Self {
        Self::fail(&AdminError::AuthorizationDenied)
    }

    fn fail(err: &AdminError) -> Self {
        Self {
            status: Status::Fail,
            created: Vec::new(),
            errors: vec![StageError {
                stage: err.stage().to_string(),
                message: err.to_string(),
            }],
            message: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// What a successful action committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    pub created: Vec<String>,
    pub message: String,
}

/// Convert an action outcome into its envelope.
pub fn report(outcome: AdminResult<Provisioned>) -> ResultEnvelope {
    match outcome {
        Ok(Provisioned { created, message }) => ResultEnvelope::success(created, message),
        Err(AdminError::Partial {
            created,
            stage,
            message,
        }) => ResultEnvelope {
            status: Status::Partial,
            created,
            errors: vec![StageError { stage, message }],
            message: None,
        },
        Err(AdminError::AuthorizationDenied) => ResultEnvelope::forbidden(),
        Err(err) => ResultEnvelope::fail(&err),
    }
}
