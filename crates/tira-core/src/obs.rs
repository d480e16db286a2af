//! Structured observability hooks for the admin action lifecycle.
//!
//! This module provides:
//! - Request-scoped tracing spans via `ActionSpan`
//! - Emission functions for dispatch, denial, precheck, failure, creation and outcome events
//!
//! Events are emitted at `info!` level, denials and failures at `warn!`.
//! For JSON output, set `TIRA_LOG_FORMAT=json`.

use tracing::{info, warn};
use uuid::Uuid;

use crate::authz::{Action, DenialReason, Role};

/// Request-scoped span tagged with action, role and a fresh request id.
///
/// Attach it to the dispatch future with `tracing::Instrument`; the span is
/// not entered across awaits.
///
/// ```ignore
/// let span = ActionSpan::new(Action::CreateTask, Role::Admin);
/// run(request).instrument(span.span()).await;
/// ```
pub struct ActionSpan {
    request_id: String,
    span: tracing::Span,
}

impl ActionSpan {
    pub fn new(action: Action, role: Role) -> Self {
        let request_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "tira.action",
            action = %action,
            role = %role,
            request_id = %request_id,
        );
        Self { request_id, span }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn span(&self) -> tracing::Span {
        self.span.clone()
    }
}

pub fn emit_action_dispatched(action: Action, resource_id: Option<&str>) {
    info!(
        event = "action.dispatched",
        action = %action,
        resource_id = resource_id.unwrap_or("-"),
    );
}

/// Emit event: authorization denied. The reason is only ever logged.
pub fn emit_action_denied(action: Action, role: Role, reason: &DenialReason) {
    warn!(event = "action.denied", action = %action, role = %role, reason = %reason);
}

pub fn emit_precheck_failed(stage: &str, error: &dyn std::fmt::Display) {
    warn!(event = "precheck.failed", stage = %stage, error = %error);
}

/// Emit event: execution failed after the prechecks passed. Carries the
/// underlying store message, which the envelope may not repeat verbatim.
pub fn emit_action_failed(action: Action, stage: &str, error: &dyn std::fmt::Display) {
    warn!(event = "action.failed", action = %action, stage = %stage, error = %error);
}

/// Emit event: one entity committed by the store.
pub fn emit_entity_created(kind: &str, id: &str) {
    info!(event = "entity.created", kind = %kind, id = %id);
}

/// Emit event: a bundle stopped after committing some entities.
pub fn emit_bundle_partial(stage: &str, committed: usize, error: &dyn std::fmt::Display) {
    warn!(
        event = "bundle.partial",
        stage = %stage,
        committed = committed,
        error = %error,
    );
}

pub fn emit_action_finished(action: Action, status: &str, duration_ms: u64) {
    info!(
        event = "action.finished",
        action = %action,
        status = %status,
        duration_ms = duration_ms,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_span_has_request_id() {
        let span = ActionSpan::new(Action::ReloadVms, Role::Admin);
        assert!(Uuid::parse_str(span.request_id()).is_ok());
    }
}
