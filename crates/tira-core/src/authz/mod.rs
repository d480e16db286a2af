//! Authorization: role- and ownership-based permission checks for admin actions.
//!
//! Default-deny: an action runs only when its policy grants the caller's
//! role and, for restricted roles, the caller owns the named resource.
//!
//! # Modules
//!
//! - [`role`]: `Role`, `Actor`, `ActorSource`
//! - [`action`]: `Action` (one variant per admin entry point)
//! - [`policy`]: `ActionPolicy`, `PolicyTable`, `standard()`
//! - [`engine`]: `PermissionEvaluator`, `Verdict`, `DenialReason`

pub mod action;
pub mod engine;
pub mod policy;
pub mod role;

pub use action::Action;
pub use engine::{DenialReason, PermissionEvaluator, Verdict};
pub use policy::{ActionPolicy, PolicyTable};
pub use role::{Actor, ActorSource, Role, StaticActor};
