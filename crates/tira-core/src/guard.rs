//! Resource existence guard for actions that name an existing resource.
//!
//! Always runs after authorization, so a caller without permission never
//! learns whether a resource exists.

use tira_state::{Entity, EntityKind, EntityLookup};

use crate::error::{AdminError, AdminResult};

/// Human-readable label for a guarded resource kind.
pub fn label(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Vm => "VM",
        EntityKind::Task => "task",
        EntityKind::Organizer => "organizer",
        EntityKind::Dataset => "dataset",
    }
}

/// Resolve `id` or fail with [`AdminError::Referential`].
pub async fn resolve(lookup: &dyn EntityLookup, kind: EntityKind, id: &str) -> AdminResult<Entity> {
    resolve_as(lookup, kind, id, label(kind)).await
}

/// Like [`resolve`], naming the entity by its role in the request
/// (e.g. "master VM").
pub async fn resolve_as(
    lookup: &dyn EntityLookup,
    kind: EntityKind,
    id: &str,
    label: &'static str,
) -> AdminResult<Entity> {
    lookup
        .lookup(kind, id)
        .await
        .map_err(|e| AdminError::from_lookup(e, label))
}

/// Verify `id` resolves before the wrapped action runs.
pub async fn ensure_exists(lookup: &dyn EntityLookup, kind: EntityKind, id: &str) -> AdminResult<()> {
    resolve(lookup, kind, id).await.map(|_| ())
}
