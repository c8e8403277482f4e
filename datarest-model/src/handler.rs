use crate::context::RequestContext;
use crate::instance::Instance;
use crate::registry::MetadataProvider;
use crate::schema::PersistentEntity;
use crate::value::Value;
use chrono::{DateTime, Utc};
use serde_json::Map;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Produces reduced "excerpt" views of entities for embedding.
///
/// When a projection is registered for an association's target type, the
/// association is embedded instead of linked.
pub trait ExcerptProjector: Send + Sync {
    /// Whether a projection is registered for the type.
    fn has_excerpt_projection(&self, entity_type: &str) -> bool;

    /// The projected view of the instance, or `None` if no projection is
    /// registered for its runtime type.
    fn project_excerpt(&self, instance: &Instance) -> Option<serde_json::Value>;
}

/// Projector with no projections: every association renders as a link.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExcerpts;

impl ExcerptProjector for NoExcerpts {
    fn has_excerpt_projection(&self, _entity_type: &str) -> bool {
        false
    }

    fn project_excerpt(&self, _instance: &Instance) -> Option<serde_json::Value> {
        None
    }
}

/// Projects an excerpt by picking a fixed list of properties per type.
#[derive(Debug, Clone, Default)]
pub struct PropertyExcerpts {
    by_type: BTreeMap<String, Vec<String>>,
}

impl PropertyExcerpts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the properties (in output order) projected for a type.
    #[must_use]
    pub fn with(mut self, entity_type: &str, properties: &[&str]) -> Self {
        self.by_type.insert(
            entity_type.to_string(),
            properties.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    pub fn from_map(by_type: BTreeMap<String, Vec<String>>) -> Self {
        Self { by_type }
    }
}

impl ExcerptProjector for PropertyExcerpts {
    fn has_excerpt_projection(&self, entity_type: &str) -> bool {
        self.by_type.contains_key(entity_type)
    }

    fn project_excerpt(&self, instance: &Instance) -> Option<serde_json::Value> {
        let properties = self.by_type.get(instance.entity_type())?;
        let map: Map<String, serde_json::Value> = properties
            .iter()
            .map(|name| (name.clone(), instance.value(name).to_json()))
            .collect();
        Some(serde_json::Value::Object(map))
    }
}

/// Reads auditing information from instances.
pub trait AuditingAccessor: Send + Sync {
    /// When the instance was last modified, if known.
    fn last_modified(&self, instance: &Instance) -> Option<DateTime<Utc>>;
}

/// Reads the entity's declared last-modified property.
pub struct PropertyAuditing {
    provider: Arc<dyn MetadataProvider>,
}

impl PropertyAuditing {
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self { provider }
    }
}

impl AuditingAccessor for PropertyAuditing {
    fn last_modified(&self, instance: &Instance) -> Option<DateTime<Utc>> {
        let entity = self.provider.entity(instance.entity_type())?;
        let property = entity.last_modified_property.as_deref()?;
        match instance.value(property) {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

/// Resolves association URIs supplied in client payloads.
///
/// Backed by the persistence layer in a real deployment.
pub trait AssociationResolver: Send + Sync {
    /// Loads the instance of `target` addressed by `uri`, if it exists.
    fn resolve(
        &self,
        context: &RequestContext,
        uri: &str,
        target: &PersistentEntity,
    ) -> Option<Instance>;
}

/// Resolver that knows no instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl AssociationResolver for NoResolver {
    fn resolve(&self, _: &RequestContext, _: &str, _: &PersistentEntity) -> Option<Instance> {
        None
    }
}
