//! In-memory dataset loaded from a JSON file.

use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use datarest_model::{
    AssociationResolver, EntityRegistry, Instance, MetadataProvider, NoResolver, PersistentEntity,
    RequestContext, Value,
};
use datarest_patch::PatchEngine;
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// How many times association URIs are re-resolved while loading.
///
/// Each pass resolves against the instances of the previous one, so targets
/// carry their own associations this many levels deep.
const RESOLVE_PASSES: usize = 2;

/// Instances per entity type, standing in for a persistence layer.
///
/// The data file maps entity type names to arrays of records:
///
/// ```json
/// {"Person": [{"id": 1, "name": "Ann", "dept": "/depts/9"}],
///  "Dept":   [{"id": 9, "name": "Eng"}]}
/// ```
///
/// Associations are written as item URIs.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    instances: BTreeMap<String, Vec<Instance>>,
}

impl Dataset {
    pub fn load(
        registry: Arc<EntityRegistry>,
        context: &RequestContext,
        document: &Json,
    ) -> Result<Self> {
        let Json::Object(types) = document else {
            bail!("dataset must be a JSON object keyed by entity type");
        };

        let mut records = Vec::new();
        for (entity_type, items) in types {
            let entity = registry
                .entity(entity_type)
                .with_context(|| format!("dataset names unknown entity type {entity_type}"))?;
            let items = items
                .as_array()
                .with_context(|| format!("records for {entity_type} must be an array"))?;
            for item in items {
                records.push((entity.name.clone(), item));
            }
        }

        // Shallow pass: associations left unset.
        let shallow = PatchEngine::new(registry.clone(), Arc::new(NoResolver));
        let mut dataset = Dataset::default();
        for (entity_type, record) in &records {
            let entity = registry.required_entity(entity_type)?;
            let tree = without_associations(entity, record);
            let instance = shallow
                .read_instance(context, entity_type, &tree)
                .with_context(|| format!("invalid {entity_type} record"))?;
            dataset.push(instance);
        }

        for pass in 0..RESOLVE_PASSES {
            let engine = PatchEngine::new(registry.clone(), Arc::new(dataset.clone()));
            let mut next = Dataset::default();
            for (entity_type, record) in &records {
                let instance = engine
                    .read_instance(context, entity_type, record)
                    .with_context(|| format!("invalid {entity_type} record"))?;
                next.push(instance);
            }
            debug!("Resolved dataset associations (pass {})", pass + 1);
            dataset = next;
        }

        debug!("Loaded {} instances", dataset.len());
        Ok(dataset)
    }

    fn push(&mut self, instance: Instance) {
        self.instances
            .entry(instance.entity_type().to_string())
            .or_default()
            .push(instance);
    }

    /// Instances of a type in file order.
    pub fn all(&self, entity_type: &str) -> &[Instance] {
        self.instances
            .get(entity_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn find(&self, entity: &PersistentEntity, id: &str) -> Option<&Instance> {
        self.all(&entity.name)
            .iter()
            .find(|instance| id_matches(entity, instance, id))
    }

    pub fn len(&self) -> usize {
        self.instances.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores an instance, replacing the one with the same identifier.
    ///
    /// Bumps the version and stamps the last-modified time, as a
    /// persistence layer would. Associations elsewhere in the dataset that
    /// reference the instance are pointed at the stored copy.
    pub fn save(
        &mut self,
        registry: &EntityRegistry,
        entity: &PersistentEntity,
        mut instance: Instance,
    ) -> Instance {
        if let Some(version) = &entity.version_property {
            let next = instance.value(version).as_i64().map_or(0, |v| v + 1);
            instance.set(version, next);
        }
        if let Some(last_modified) = &entity.last_modified_property {
            instance.set(last_modified, Utc::now());
        }

        let id = instance.value(&entity.id_property).to_key_string();
        let items = self.instances.entry(entity.name.clone()).or_default();
        let existing = id
            .as_deref()
            .and_then(|id| items.iter().position(|i| id_matches(entity, i, id)));
        match existing {
            Some(index) => items[index] = instance.clone(),
            None => items.push(instance.clone()),
        }
        if let Some(id) = id {
            self.refresh_references(registry, entity, &instance, &id);
        }
        instance
    }

    /// Replaces association targets matching `saved` with its stored copy.
    ///
    /// Only direct references are refreshed; targets nested inside other
    /// targets keep the state they were resolved with.
    fn refresh_references(
        &mut self,
        registry: &EntityRegistry,
        entity: &PersistentEntity,
        saved: &Instance,
        id: &str,
    ) {
        let mut refreshed = 0;
        for (entity_type, items) in &mut self.instances {
            let Some(referrer) = registry.entity(entity_type) else {
                continue;
            };
            let properties: Vec<&str> = referrer
                .associations()
                .filter(|p| p.target.as_deref() == Some(entity.name.as_str()))
                .map(|p| p.name.as_str())
                .collect();
            if properties.is_empty() {
                continue;
            }
            for instance in items.iter_mut() {
                for property in &properties {
                    if let Some(value) = instance.remove(property) {
                        let (value, count) = replace_target(value, entity, saved, id);
                        instance.set(property, value);
                        refreshed += count;
                    }
                }
            }
        }
        if refreshed > 0 {
            debug!("Refreshed {} references to {} {}", refreshed, entity.name, id);
        }
    }
}

fn replace_target(
    value: Value,
    entity: &PersistentEntity,
    saved: &Instance,
    id: &str,
) -> (Value, usize) {
    match value {
        Value::Entity(target)
            if target.entity_type() == entity.name && id_matches(entity, &target, id) =>
        {
            (Value::entity(saved.clone()), 1)
        }
        Value::List(items) => {
            let mut count = 0;
            let items = items
                .into_iter()
                .map(|item| {
                    let (item, n) = replace_target(item, entity, saved, id);
                    count += n;
                    item
                })
                .collect();
            (Value::List(items), count)
        }
        Value::Map(entries) => {
            let mut count = 0;
            let entries = entries
                .into_iter()
                .map(|(key, item)| {
                    let (item, n) = replace_target(item, entity, saved, id);
                    count += n;
                    (key, item)
                })
                .collect();
            (Value::Map(entries), count)
        }
        other => (other, 0),
    }
}

impl AssociationResolver for Dataset {
    fn resolve(
        &self,
        context: &RequestContext,
        uri: &str,
        target: &PersistentEntity,
    ) -> Option<Instance> {
        let (collection, id) = context.split_item_uri(uri)?;
        if collection != target.collection_path {
            return None;
        }
        self.find(target, id).cloned()
    }
}

fn id_matches(entity: &PersistentEntity, instance: &Instance, id: &str) -> bool {
    instance
        .value(&entity.id_property)
        .to_key_string()
        .is_some_and(|candidate| candidate == id)
}

fn without_associations(entity: &PersistentEntity, record: &Json) -> Json {
    let Json::Object(fields) = record else {
        return record.clone();
    };
    let kept: Map<String, Json> = fields
        .iter()
        .filter(|(name, _)| entity.property(name).is_none_or(|p| !p.is_association()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    Json::Object(kept)
}

/// Parses an identifier from a URI segment according to the declared type.
pub fn parse_id(entity: &PersistentEntity, id: &str) -> Result<Value> {
    let property = entity
        .id()
        .with_context(|| format!("{} declares no identifier", entity.name))?;
    Value::from_json(&Json::String(id.to_string()), property.value_type).map_err(|e| {
        anyhow!(
            "invalid {} identifier '{}': expected {}",
            entity.name,
            id,
            e.expected
        )
    })
}
