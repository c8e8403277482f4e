//! Operation-based patches (RFC 6902 JSON Patch).

use crate::error::{PatchError, PatchResult};
use crate::pointer::{JsonPointer, parse_index};
use datarest_model::PersistentEntity;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// A single JSON Patch operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: String, value: Json },
    Remove { path: String },
    Replace { path: String, value: Json },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    Test { path: String, value: Json },
}

impl PatchOperation {
    pub fn path(&self) -> &str {
        match self {
            PatchOperation::Add { path, .. }
            | PatchOperation::Remove { path }
            | PatchOperation::Replace { path, .. }
            | PatchOperation::Move { path, .. }
            | PatchOperation::Copy { path, .. }
            | PatchOperation::Test { path, .. } => path,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PatchOperation::Add { .. } => "add",
            PatchOperation::Remove { .. } => "remove",
            PatchOperation::Replace { .. } => "replace",
            PatchOperation::Move { .. } => "move",
            PatchOperation::Copy { .. } => "copy",
            PatchOperation::Test { .. } => "test",
        }
    }
}

/// An ordered list of operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonPatch(pub Vec<PatchOperation>);

impl JsonPatch {
    /// Parses a patch document. Anything other than an array of well-formed
    /// operations is a malformed document.
    pub fn from_json(document: &Json) -> PatchResult<Self> {
        if !document.is_array() {
            return Err(PatchError::malformed("JSON Patch document must be an array"));
        }
        serde_json::from_value(document.clone())
            .map_err(|e| PatchError::malformed(format!("invalid JSON Patch operation: {e}")))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Applies every operation, in order, to a copy of `tree`.
    ///
    /// Paths must start at an exported property of `entity`. Any failure
    /// discards the copy, so `tree` is returned untouched or fully patched.
    pub fn apply(&self, tree: &Json, entity: &PersistentEntity) -> PatchResult<Json> {
        let mut document = tree.clone();
        for operation in &self.0 {
            apply_operation(&mut document, operation, entity)?;
        }
        Ok(document)
    }
}

fn apply_operation(
    document: &mut Json,
    operation: &PatchOperation,
    entity: &PersistentEntity,
) -> PatchResult<()> {
    match operation {
        PatchOperation::Add { path, value } => {
            let path = property_pointer(path, entity)?;
            add(document, &path, value.clone())
        }
        PatchOperation::Remove { path } => {
            let path = property_pointer(path, entity)?;
            remove(document, &path).map(drop)
        }
        PatchOperation::Replace { path, value } => {
            let path = property_pointer(path, entity)?;
            let target = path
                .get_mut(document)
                .ok_or_else(|| missing(&path))?;
            *target = value.clone();
            Ok(())
        }
        PatchOperation::Move { from, path } => {
            let from = property_pointer(from, entity)?;
            let path = property_pointer(path, entity)?;
            if from == path {
                return from.get(document).map(drop).ok_or_else(|| missing(&from));
            }
            if from.is_proper_prefix_of(&path) {
                return Err(PatchError::malformed(format!(
                    "cannot move '{from}' into its own child '{path}'"
                )));
            }
            let value = remove(document, &from)?;
            add(document, &path, value)
        }
        PatchOperation::Copy { from, path } => {
            let from = property_pointer(from, entity)?;
            let path = property_pointer(path, entity)?;
            let value = from.get(document).cloned().ok_or_else(|| missing(&from))?;
            add(document, &path, value)
        }
        PatchOperation::Test { path, value } => {
            let pointer = JsonPointer::parse(path)?;
            if !pointer.is_root() {
                check_property(&pointer, entity)?;
            }
            let actual = pointer.get(document).ok_or_else(|| missing(&pointer))?;
            if actual != value {
                return Err(PatchError::TestOperationFailed {
                    path: path.clone(),
                    expected: value.clone(),
                    actual: actual.clone(),
                });
            }
            Ok(())
        }
    }
}

/// Parses a non-root pointer whose first token is an exported property.
fn property_pointer(path: &str, entity: &PersistentEntity) -> PatchResult<JsonPointer> {
    let pointer = JsonPointer::parse(path)?;
    if pointer.is_root() {
        return Err(PatchError::malformed("operations on the document root are not supported"));
    }
    check_property(&pointer, entity)?;
    Ok(pointer)
}

fn check_property(pointer: &JsonPointer, entity: &PersistentEntity) -> PatchResult<()> {
    let head = pointer.head().unwrap_or_default();
    match entity.property(head) {
        Some(property) if property.exported => Ok(()),
        _ => Err(PatchError::unresolvable(&entity.name, &pointer.to_string())),
    }
}

fn missing(pointer: &JsonPointer) -> PatchError {
    PatchError::malformed(format!("no value at '{pointer}'"))
}

fn add(document: &mut Json, pointer: &JsonPointer, value: Json) -> PatchResult<()> {
    let Some((parent, last)) = pointer.split_last() else {
        return Err(missing(pointer));
    };
    let container = parent.get_mut(document).ok_or_else(|| missing(&parent))?;

    match container {
        Json::Object(map) => {
            map.insert(last.to_string(), value);
            Ok(())
        }
        Json::Array(items) => {
            if last == "-" {
                items.push(value);
                return Ok(());
            }
            let index = parse_index(last)
                .ok_or_else(|| PatchError::malformed(format!("invalid array index in '{pointer}'")))?;
            if index > items.len() {
                return Err(PatchError::malformed(format!(
                    "index {index} out of bounds at '{pointer}' (length {})",
                    items.len()
                )));
            }
            items.insert(index, value);
            Ok(())
        }
        _ => Err(PatchError::malformed(format!(
            "'{parent}' is neither an object nor an array"
        ))),
    }
}

/// Removes and returns the addressed value.
///
/// Top-level members (entity properties) are set to `null` instead of
/// being dropped, so that binding clears the property.
fn remove(document: &mut Json, pointer: &JsonPointer) -> PatchResult<Json> {
    let Some((parent, last)) = pointer.split_last() else {
        return Err(missing(pointer));
    };
    let top_level = parent.is_root();
    let container = parent.get_mut(document).ok_or_else(|| missing(pointer))?;

    match container {
        Json::Object(map) if top_level => map
            .get_mut(last)
            .map(|member| std::mem::replace(member, Json::Null))
            .ok_or_else(|| missing(pointer)),
        Json::Object(map) => map.shift_remove(last).ok_or_else(|| missing(pointer)),
        Json::Array(items) => match parse_index(last) {
            Some(index) if index < items.len() => Ok(items.remove(index)),
            _ => Err(missing(pointer)),
        },
        _ => Err(missing(pointer)),
    }
}
