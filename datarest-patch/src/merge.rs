//! Recursive merge patches.

use crate::error::{PatchError, PatchResult};
use datarest_model::PersistentEntity;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

/// How arrays in a merge patch combine with the existing array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayMergePolicy {
    /// Element-wise merge by position; the result takes the patch's length.
    #[default]
    Positional,
    /// The patch array replaces the existing one.
    Replace,
}

/// Merges `patch` into a copy of `base`.
///
/// Top-level keys must name properties of `entity`. Association properties
/// are replaced rather than merged; a top-level `null` clears the property.
/// Fields absent from the patch are left untouched.
pub fn merge_patch(
    base: &Json,
    patch: &Json,
    entity: &PersistentEntity,
    policy: ArrayMergePolicy,
) -> PatchResult<Json> {
    let Json::Object(fields) = patch else {
        return Err(PatchError::malformed("merge patch must be a JSON object"));
    };

    let mut merged = match base {
        Json::Object(map) => map.clone(),
        _ => Map::new(),
    };

    for (name, value) in fields {
        let property = entity
            .property(name)
            .ok_or_else(|| PatchError::unresolvable(&entity.name, name))?;

        let slot = merged.entry(name.clone()).or_insert(Json::Null);
        if property.is_association() || value.is_null() {
            *slot = value.clone();
        } else {
            merge_value(slot, value, policy);
        }
    }

    Ok(Json::Object(merged))
}

/// Merges below the top level. Nested `null` members are removed, following
/// RFC 7396.
fn merge_value(target: &mut Json, patch: &Json, policy: ArrayMergePolicy) {
    match (target, patch) {
        (Json::Object(existing), Json::Object(fields)) => {
            for (key, value) in fields {
                if value.is_null() {
                    existing.shift_remove(key);
                } else {
                    merge_value(existing.entry(key.clone()).or_insert(Json::Null), value, policy);
                }
            }
        }
        (Json::Array(existing), Json::Array(items)) if policy == ArrayMergePolicy::Positional => {
            existing.truncate(items.len());
            for (index, item) in items.iter().enumerate() {
                match existing.get_mut(index) {
                    Some(slot) => merge_value(slot, item, policy),
                    None => existing.push(fresh(item, policy)),
                }
            }
        }
        (target, patch) => *target = fresh(patch, policy),
    }
}

/// A patch value merged onto nothing: objects lose their `null` members.
fn fresh(patch: &Json, policy: ArrayMergePolicy) -> Json {
    match patch {
        Json::Object(_) => {
            let mut target = Json::Object(Map::new());
            merge_value(&mut target, patch, policy);
            target
        }
        Json::Array(items) if policy == ArrayMergePolicy::Positional => {
            Json::Array(items.iter().map(|item| fresh(item, policy)).collect())
        }
        other => other.clone(),
    }
}
