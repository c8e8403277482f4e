//! Binding of JSON trees onto instances.
//!
//! All three patch strategies end here: they only differ in the tree they
//! produce and the instance they bind it onto.

use crate::error::{PatchError, PatchResult};
use crate::tree::TreeMaterializer;
use datarest_model::{
    AssociationResolver, Cardinality, Instance, MetadataProvider, PersistentEntity,
    PersistentProperty, RequestContext, Value,
};
use serde_json::Value as Json;
use std::sync::Arc;
use tracing::debug;

/// Whether server-owned properties may be written from the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trust {
    /// Client payloads: identifier, version, protected and non-exported
    /// properties are ignored.
    Client,
    /// Data loaded by the application itself.
    Trusted,
}

/// Converts JSON trees into instances using entity metadata.
#[derive(Clone)]
pub struct Binder {
    metadata: Arc<dyn MetadataProvider>,
    resolver: Arc<dyn AssociationResolver>,
    materializer: TreeMaterializer,
}

impl Binder {
    pub fn new(metadata: Arc<dyn MetadataProvider>, resolver: Arc<dyn AssociationResolver>) -> Self {
        Self {
            materializer: TreeMaterializer::new(metadata.clone()),
            metadata,
            resolver,
        }
    }

    /// Binds a client tree onto a copy of `base`, or onto a fresh instance.
    ///
    /// Only properties present in the tree are written. Values whose tree
    /// form is unchanged keep their original representation.
    pub fn bind(
        &self,
        context: &RequestContext,
        tree: &Json,
        entity: &PersistentEntity,
        base: Option<&Instance>,
    ) -> PatchResult<Instance> {
        let target = base
            .cloned()
            .unwrap_or_else(|| Instance::new(entity.name.as_str()));
        self.bind_fields(context, tree, entity, target, base, Trust::Client)
    }

    /// Binds a client tree onto a fresh instance, consulting `reference`
    /// only to reuse unchanged values and association targets.
    pub fn bind_new(
        &self,
        context: &RequestContext,
        tree: &Json,
        entity: &PersistentEntity,
        reference: Option<&Instance>,
    ) -> PatchResult<Instance> {
        let target = Instance::new(entity.name.as_str());
        self.bind_fields(context, tree, entity, target, reference, Trust::Client)
    }

    /// Binds every property of the tree, server-owned ones included.
    pub fn read_instance(
        &self,
        context: &RequestContext,
        tree: &Json,
        entity: &PersistentEntity,
    ) -> PatchResult<Instance> {
        let target = Instance::new(entity.name.as_str());
        self.bind_fields(context, tree, entity, target, None, Trust::Trusted)
    }

    fn bind_fields(
        &self,
        context: &RequestContext,
        tree: &Json,
        entity: &PersistentEntity,
        mut target: Instance,
        reference: Option<&Instance>,
        trust: Trust,
    ) -> PatchResult<Instance> {
        let Json::Object(fields) = tree else {
            return Err(PatchError::malformed(format!(
                "{} payload must be a JSON object",
                entity.name
            )));
        };

        let mut bound = 0;
        for (name, json) in fields {
            let property = entity
                .property(name)
                .ok_or_else(|| PatchError::unresolvable(&entity.name, name))?;

            if trust == Trust::Client && (entity.is_server_owned(property) || !property.exported) {
                debug!("Ignoring server-owned property {}.{}", entity.name, name);
                continue;
            }

            if let Some(reference) = reference {
                if self.is_unchanged(context, property, reference, json) {
                    if let Some(value) = reference.get(name) {
                        target.set(name, value.clone());
                    }
                    continue;
                }
            }

            let existing = reference.map(|r| r.value(name));
            let value = self.convert(context, property, json, existing, trust)?;
            target.set(name, value);
            bound += 1;
        }

        debug!("Bound {} changed properties onto {}", bound, entity.name);
        Ok(target)
    }

    fn is_unchanged(
        &self,
        context: &RequestContext,
        property: &PersistentProperty,
        reference: &Instance,
        json: &Json,
    ) -> bool {
        self.materializer
            .property_tree(context, property, reference.value(&property.name))
            .is_ok_and(|current| current == *json)
    }

    fn convert(
        &self,
        context: &RequestContext,
        property: &PersistentProperty,
        json: &Json,
        existing: Option<&Value>,
        trust: Trust,
    ) -> PatchResult<Value> {
        match (property.cardinality, json) {
            (_, Json::Null) => Ok(Value::Null),
            (Cardinality::Scalar, _) => self.convert_element(context, property, json, existing, trust),
            (Cardinality::Collection, Json::Array(items)) => items
                .iter()
                .map(|item| self.convert_element(context, property, item, existing, trust))
                .collect::<PatchResult<Vec<_>>>()
                .map(Value::List),
            (Cardinality::Map, Json::Object(entries)) => {
                let mut map = Vec::with_capacity(entries.len());
                for (key, item) in entries {
                    let key = self.map_key(context, key, existing);
                    let value = self.convert_element(context, property, item, existing, trust)?;
                    map.push((key, value));
                }
                Ok(Value::Map(map))
            }
            (Cardinality::Collection, other) => Err(conversion(property, "array", other)),
            (Cardinality::Map, other) => Err(conversion(property, "object", other)),
        }
    }

    fn convert_element(
        &self,
        context: &RequestContext,
        property: &PersistentProperty,
        json: &Json,
        existing: Option<&Value>,
        trust: Trust,
    ) -> PatchResult<Value> {
        if let Some(target_type) = property.target.as_deref() {
            return self.convert_reference(context, property, target_type, json, existing, trust);
        }

        Value::from_json(json, property.value_type).map_err(|err| PatchError::TypeConversionFailure {
            property: property.name.clone(),
            expected: err.expected.to_string(),
            found: err.found,
        })
    }

    /// Association values bind from a URI or from a nested object.
    fn convert_reference(
        &self,
        context: &RequestContext,
        property: &PersistentProperty,
        target_type: &str,
        json: &Json,
        existing: Option<&Value>,
        trust: Trust,
    ) -> PatchResult<Value> {
        let target = self.metadata.required_entity(target_type)?;

        match json {
            Json::Null => Ok(Value::Null),
            Json::String(uri) => {
                if let Some(current) = self.current_target(context, uri, existing) {
                    return Ok(Value::entity(current.clone()));
                }
                self.resolver
                    .resolve(context, uri, target)
                    .map(Value::entity)
                    .ok_or_else(|| PatchError::TypeConversionFailure {
                        property: property.name.clone(),
                        expected: format!("URI of a {target_type}"),
                        found: format!("unresolvable URI \"{uri}\""),
                    })
            }
            Json::Object(_) => {
                let nested = Instance::new(target.name.as_str());
                self.bind_fields(context, json, target, nested, None, trust)
                    .map(Value::entity)
            }
            other => Err(conversion(property, &format!("URI of a {target_type}"), other)),
        }
    }

    /// An already-referenced target addressed by `uri`, if any.
    fn current_target<'v>(
        &self,
        context: &RequestContext,
        uri: &str,
        existing: Option<&'v Value>,
    ) -> Option<&'v Instance> {
        let candidates: Vec<&Value> = match existing? {
            Value::List(items) => items.iter().collect(),
            Value::Map(entries) => entries.iter().map(|(_, v)| v).collect(),
            other => vec![other],
        };

        candidates
            .into_iter()
            .filter_map(Value::as_entity)
            .find(|candidate| {
                self.materializer
                    .self_href(context, candidate)
                    .is_ok_and(|href| same_resource(context, &href, uri))
            })
    }

    /// Reuses the existing key whose string form matches, so entity keys
    /// survive a round trip.
    fn map_key(&self, context: &RequestContext, key: &str, existing: Option<&Value>) -> Value {
        existing
            .and_then(Value::as_map)
            .and_then(|entries| {
                entries.iter().map(|(k, _)| k).find(|k| {
                    self.materializer
                        .key_string(context, k)
                        .is_ok_and(|s| s == key)
                })
            })
            .cloned()
            .unwrap_or_else(|| Value::Text(key.to_string()))
    }
}

fn same_resource(context: &RequestContext, a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    match (context.split_item_uri(a), context.split_item_uri(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

fn conversion(property: &PersistentProperty, expected: &str, found: &Json) -> PatchError {
    PatchError::TypeConversionFailure {
        property: property.name.clone(),
        expected: expected.to_string(),
        found: describe(found),
    }
}

fn describe(json: &Json) -> String {
    match json {
        Json::Null => "null".into(),
        Json::Bool(b) => format!("boolean {b}"),
        Json::Number(n) => format!("number {n}"),
        Json::String(s) => format!("string \"{s}\""),
        Json::Array(_) => "array".into(),
        Json::Object(_) => "object".into(),
    }
}
