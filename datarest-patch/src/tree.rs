//! Materialization of instances into client-facing JSON trees.

use crate::error::PatchResult;
use datarest_model::{
    Instance, MetadataProvider, PersistentEntity, PersistentProperty, RequestContext,
    SelfLinkProvider, Value,
};
use serde_json::{Map, Value as Json};
use std::sync::Arc;

/// Renders instances as the JSON trees patch documents are applied to.
///
/// Every exported property appears, unset ones as `null`. Association values
/// render as the targets' self URIs: a string, an array of strings, or an
/// object keyed by the map key's string form.
#[derive(Clone)]
pub struct TreeMaterializer {
    metadata: Arc<dyn MetadataProvider>,
    self_links: SelfLinkProvider,
}

impl TreeMaterializer {
    pub fn new(metadata: Arc<dyn MetadataProvider>) -> Self {
        Self {
            self_links: SelfLinkProvider::new(metadata.clone()),
            metadata,
        }
    }

    pub fn materialize(&self, context: &RequestContext, instance: &Instance) -> PatchResult<Json> {
        let entity = self.metadata.required_entity(instance.entity_type())?;
        self.materialize_as(context, instance, entity)
    }

    pub(crate) fn materialize_as(
        &self,
        context: &RequestContext,
        instance: &Instance,
        entity: &PersistentEntity,
    ) -> PatchResult<Json> {
        let mut tree = Map::new();
        for property in entity.properties.iter().filter(|p| p.exported) {
            let value = self.property_tree(context, property, instance.value(&property.name))?;
            tree.insert(property.name.clone(), value);
        }
        Ok(Json::Object(tree))
    }

    /// Tree form of one property value.
    pub(crate) fn property_tree(
        &self,
        context: &RequestContext,
        property: &PersistentProperty,
        value: &Value,
    ) -> PatchResult<Json> {
        if !property.is_association() {
            return Ok(value.to_json());
        }

        match value {
            Value::Null => Ok(Json::Null),
            Value::List(items) => items
                .iter()
                .map(|item| self.reference(context, item))
                .collect::<PatchResult<Vec<_>>>()
                .map(Json::Array),
            Value::Map(entries) => {
                let mut map = Map::new();
                for (key, item) in entries {
                    map.insert(self.key_string(context, key)?, self.reference(context, item)?);
                }
                Ok(Json::Object(map))
            }
            other => self.reference(context, other),
        }
    }

    /// String form of a map key: entity keys become their self URI.
    pub(crate) fn key_string(&self, context: &RequestContext, key: &Value) -> PatchResult<String> {
        if let Some(entity) = key.as_entity() {
            return Ok(self.self_links.self_href(context, entity)?);
        }
        Ok(key
            .to_key_string()
            .unwrap_or_else(|| key.to_json().to_string()))
    }

    pub(crate) fn self_href(&self, context: &RequestContext, instance: &Instance) -> PatchResult<String> {
        Ok(self.self_links.self_href(context, instance)?)
    }

    fn reference(&self, context: &RequestContext, value: &Value) -> PatchResult<Json> {
        match value.as_entity() {
            Some(target) => Ok(Json::String(self.self_links.self_href(context, target)?)),
            None => Ok(value.to_json()),
        }
    }
}
