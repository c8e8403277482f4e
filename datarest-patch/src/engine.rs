//! Strategy selection and the patch engine facade.

use crate::binder::Binder;
use crate::error::{PatchError, PatchResult};
use crate::json_patch::JsonPatch;
use crate::merge::{ArrayMergePolicy, merge_patch};
use crate::put::put;
use crate::tree::TreeMaterializer;
use datarest_model::{
    AssociationResolver, Instance, MetadataProvider, PersistentEntity, RequestContext,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

pub const JSON_PATCH_MEDIA_TYPE: &str = "application/json-patch+json";
pub const MERGE_PATCH_MEDIA_TYPE: &str = "application/merge-patch+json";

/// The three update semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchStrategy {
    /// RFC 6902 operations replayed against the materialized instance.
    JsonPatch,
    /// Recursive merge of a partial tree.
    MergePatch,
    /// Full replacement preserving server-owned properties.
    Put,
}

impl PatchStrategy {
    /// Strategy for a PATCH request body of the given content type.
    ///
    /// `application/json-patch+json` selects operations; every other JSON
    /// type is treated as a merge patch. PUT requests use [`Self::Put`]
    /// regardless of content type.
    pub fn from_content_type(content_type: &str) -> Self {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if essence == JSON_PATCH_MEDIA_TYPE {
            PatchStrategy::JsonPatch
        } else {
            PatchStrategy::MergePatch
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PatchStrategy::JsonPatch => "JSON Patch",
            PatchStrategy::MergePatch => "merge patch",
            PatchStrategy::Put => "PUT",
        }
    }
}

impl fmt::Display for PatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Patch settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchConfig {
    #[serde(default)]
    pub array_merge: ArrayMergePolicy,
}

/// Applies patches to instances without touching the caller's copy.
#[derive(Clone)]
pub struct PatchEngine {
    metadata: Arc<dyn MetadataProvider>,
    materializer: TreeMaterializer,
    binder: Binder,
    config: PatchConfig,
}

impl PatchEngine {
    pub fn new(metadata: Arc<dyn MetadataProvider>, resolver: Arc<dyn AssociationResolver>) -> Self {
        Self {
            materializer: TreeMaterializer::new(metadata.clone()),
            binder: Binder::new(metadata.clone(), resolver),
            metadata,
            config: PatchConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: PatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PatchConfig {
        &self.config
    }

    /// Applies `payload` with the given strategy.
    ///
    /// JSON Patch and merge patch need `existing`; PUT without it creates a
    /// new `entity_type` instance.
    pub fn apply(
        &self,
        context: &RequestContext,
        strategy: PatchStrategy,
        entity_type: &str,
        existing: Option<&Instance>,
        payload: &Json,
    ) -> PatchResult<Instance> {
        match strategy {
            PatchStrategy::JsonPatch => {
                let existing = existing.ok_or_else(|| PatchError::MissingTarget(strategy.name()))?;
                let patch = JsonPatch::from_json(payload)?;
                self.apply_json_patch(context, existing, &patch)
            }
            PatchStrategy::MergePatch => {
                let existing = existing.ok_or_else(|| PatchError::MissingTarget(strategy.name()))?;
                self.apply_merge_patch(context, existing, payload)
            }
            PatchStrategy::Put => self.apply_put(context, entity_type, existing, payload),
        }
    }

    /// Replays the operations against the materialized instance, then binds.
    pub fn apply_json_patch(
        &self,
        context: &RequestContext,
        existing: &Instance,
        patch: &JsonPatch,
    ) -> PatchResult<Instance> {
        let entity = self.exported_entity(existing.entity_type())?;
        let tree = self.materializer.materialize_as(context, existing, entity)?;
        let patched = patch.apply(&tree, entity)?;
        let updated = self.binder.bind(context, &patched, entity, Some(existing))?;

        debug!("Applied {} patch operations to {}", patch.len(), entity.name);
        Ok(updated)
    }

    /// Merges the partial tree into the materialized instance, then binds.
    pub fn apply_merge_patch(
        &self,
        context: &RequestContext,
        existing: &Instance,
        patch: &Json,
    ) -> PatchResult<Instance> {
        let entity = self.exported_entity(existing.entity_type())?;
        let tree = self.materializer.materialize_as(context, existing, entity)?;
        let merged = merge_patch(&tree, patch, entity, self.config.array_merge)?;
        let updated = self.binder.bind(context, &merged, entity, Some(existing))?;

        debug!(
            "Applied merge patch with {} fields to {}",
            patch.as_object().map_or(0, |fields| fields.len()),
            entity.name
        );
        Ok(updated)
    }

    /// Binds the full representation, keeping server-owned properties of
    /// `existing`.
    pub fn apply_put(
        &self,
        context: &RequestContext,
        entity_type: &str,
        existing: Option<&Instance>,
        payload: &Json,
    ) -> PatchResult<Instance> {
        let entity = self.exported_entity(entity_type)?;
        if let Some(existing) = existing {
            if existing.entity_type() != entity.name {
                return Err(PatchError::malformed(format!(
                    "cannot replace a {} with a {}",
                    existing.entity_type(),
                    entity.name
                )));
            }
        }

        let updated = put(&self.binder, context, payload, entity, existing)?;
        match existing {
            Some(_) => debug!("Replaced {} from full representation", entity.name),
            None => info!("Created {} from full representation", entity.name),
        }
        Ok(updated)
    }

    /// Trusted binding of a complete tree, server-owned properties included.
    pub fn read_instance(
        &self,
        context: &RequestContext,
        entity_type: &str,
        tree: &Json,
    ) -> PatchResult<Instance> {
        let entity = self.metadata.required_entity(entity_type)?;
        self.binder.read_instance(context, tree, entity)
    }

    /// The tree patch documents are applied to.
    pub fn materialize(&self, context: &RequestContext, instance: &Instance) -> PatchResult<Json> {
        self.materializer.materialize(context, instance)
    }

    fn exported_entity(&self, entity_type: &str) -> PatchResult<&PersistentEntity> {
        let entity = self.metadata.required_entity(entity_type)?;
        if !entity.exported {
            return Err(PatchError::ResourceNotFound(format!(
                "{entity_type} is not exported"
            )));
        }
        Ok(entity)
    }
}
