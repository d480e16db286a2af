//! TIRA Admin Core
//!
//! Permission-gated administration for the TIRA evaluation platform:
//! every admin action runs through one pipeline (authorize, validate,
//! guard, execute, report) and returns a [`ResultEnvelope`].

pub mod authz;
pub mod config;
pub mod error;
pub mod guard;
pub mod metrics;
pub mod obs;
pub mod pipeline;
pub mod provisioning;
pub mod report;
pub mod request;
pub mod telemetry;

pub use authz::{
    Action, ActionPolicy, Actor, ActorSource, DenialReason, PermissionEvaluator, PolicyTable, Role,
    StaticActor, Verdict,
};
pub use config::{AdminConfig, ConfigError, Deployment, LoggingConfig};
pub use error::{AdminError, AdminResult};
pub use guard::ensure_exists;
pub use pipeline::AdminService;
pub use provisioning::{parse_measures, Provisioner};
pub use report::{report, Provisioned, ResultEnvelope, StageError, Status};
pub use request::{
    AddDatasetForm, AddDatasetRequest, AdminRequest, CreateTaskForm, CreateTaskRequest,
    SplitFlags, ValidatedRequest,
};

pub use metrics::METRICS;
pub use obs::{
    emit_action_denied, emit_action_dispatched, emit_action_failed, emit_action_finished,
    emit_bundle_partial, emit_entity_created, emit_precheck_failed, ActionSpan,
};
pub use telemetry::{init_from_config, init_tracing};

/// TIRA admin version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
