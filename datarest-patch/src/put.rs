//! Updates from a full representation.

use crate::binder::Binder;
use crate::error::PatchResult;
use datarest_model::{Instance, PersistentEntity, RequestContext};
use serde_json::Value as Json;

/// Binds `payload` as a new instance, then carries over every property the
/// client cannot write from `existing`.
///
/// Exported, client-writable properties missing from the payload end up
/// unset. Without `existing` this is plain creation.
pub fn put(
    binder: &Binder,
    context: &RequestContext,
    payload: &Json,
    entity: &PersistentEntity,
    existing: Option<&Instance>,
) -> PatchResult<Instance> {
    let mut updated = binder.bind_new(context, payload, entity, existing)?;
    if let Some(existing) = existing {
        regraft(entity, &mut updated, existing);
    }
    Ok(updated)
}

/// Copies identifier, version, protected and non-exported properties.
fn regraft(entity: &PersistentEntity, updated: &mut Instance, existing: &Instance) {
    for property in &entity.properties {
        if !entity.is_server_owned(property) && property.exported {
            continue;
        }
        match existing.get(&property.name) {
            Some(value) => updated.set(&property.name, value.clone()),
            None => {
                updated.remove(&property.name);
            }
        }
    }
}
