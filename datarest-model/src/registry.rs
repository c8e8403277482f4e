use crate::error::{ModelError, ModelResult};
use crate::schema::{PersistentEntity, PersistentProperty};
use crate::value::Value;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Supplies entity metadata to the assembly and patch layers.
///
/// How the metadata is discovered is up to the implementation; the core only
/// relies on this lookup contract.
pub trait MetadataProvider: Send + Sync {
    /// Metadata for an entity type, if known.
    fn entity(&self, entity_type: &str) -> Option<&PersistentEntity>;

    /// Metadata for the entity exposed under a collection path segment.
    fn entity_for_collection(&self, collection_path: &str) -> Option<&PersistentEntity>;

    /// Metadata for an entity type, failing with [`ModelError::UnknownEntityType`].
    fn required_entity(&self, entity_type: &str) -> ModelResult<&PersistentEntity> {
        self.entity(entity_type)
            .ok_or_else(|| ModelError::UnknownEntityType(entity_type.to_string()))
    }

    /// Canonical string form of an identifier value, used in self links.
    fn id_to_string(&self, _entity: &PersistentEntity, id: &Value) -> Option<String> {
        id.to_key_string()
    }

    /// Whether an association property renders as a link or embed.
    ///
    /// The property itself must be exported and its target type must be
    /// known and exported.
    fn is_linkable(&self, property: &PersistentProperty) -> bool {
        property.exported
            && property
                .target
                .as_deref()
                .and_then(|target| self.entity(target))
                .is_some_and(|target| target.exported)
    }
}

#[derive(Deserialize)]
struct RegistryDocument {
    entities: Vec<PersistentEntity>,
}

/// In-memory [`MetadataProvider`] built from descriptors.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: BTreeMap<String, PersistentEntity>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and registers an entity, replacing any previous descriptor
    /// with the same name.
    pub fn register(&mut self, entity: PersistentEntity) -> ModelResult<()> {
        entity.validate()?;

        if let Some(clash) = self
            .entities
            .values()
            .find(|e| e.collection_path == entity.collection_path && e.name != entity.name)
        {
            return Err(ModelError::InvalidMetadata {
                entity_type: entity.name.clone(),
                reason: format!(
                    "collection path '{}' already used by {}",
                    entity.collection_path, clash.name
                ),
            });
        }

        debug!(
            "Registered entity {} ({} properties) at /{}",
            entity.name,
            entity.properties.len(),
            entity.collection_path
        );
        self.entities.insert(entity.name.clone(), entity);
        Ok(())
    }

    /// Builder form of [`EntityRegistry::register`].
    pub fn with(mut self, entity: PersistentEntity) -> ModelResult<Self> {
        self.register(entity)?;
        Ok(self)
    }

    /// Loads descriptors from a JSON document of the form `{"entities": [...]}`.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        let document: RegistryDocument = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for entity in document.entities {
            registry.register(entity)?;
        }
        Ok(registry)
    }

    /// Registered entities in name order.
    pub fn entities(&self) -> impl Iterator<Item = &PersistentEntity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl MetadataProvider for EntityRegistry {
    fn entity(&self, entity_type: &str) -> Option<&PersistentEntity> {
        self.entities.get(entity_type)
    }

    fn entity_for_collection(&self, collection_path: &str) -> Option<&PersistentEntity> {
        self.entities
            .values()
            .find(|e| e.collection_path == collection_path)
    }
}
