//! Shared fixtures for patch tests.

#![allow(dead_code)]

use datarest_model::{
    AssociationResolver, EntityRegistry, Instance, PersistentEntity, PersistentProperty,
    RequestContext, Value,
};
use datarest_patch::{PatchConfig, PatchEngine};
use std::sync::Arc;

pub const BASE: &str = "http://localhost/api";

pub fn context() -> RequestContext {
    RequestContext::new(BASE)
}

pub fn registry() -> EntityRegistry {
    EntityRegistry::new()
        .with(
            PersistentEntity::new("Person", "people", "id")
                .with_version("version")
                .with_property(PersistentProperty::text("name"))
                .with_property(PersistentProperty::integer("age"))
                .with_property(PersistentProperty::object("address"))
                .with_property(PersistentProperty::text("tags").collection())
                .with_property(PersistentProperty::integer("scores").map())
                .with_property(PersistentProperty::text("password").hidden())
                .with_property(PersistentProperty::text("createdBy").protected())
                .with_property(PersistentProperty::to_one("dept", "Dept"))
                .with_property(PersistentProperty::to_many("friends", "Person"))
                .with_property(PersistentProperty::to_map("roles", "Dept")),
        )
        .unwrap()
        .with(
            PersistentEntity::new("Dept", "depts", "id")
                .with_property(PersistentProperty::text("name")),
        )
        .unwrap()
}

/// Resolves item URIs against a fixed set of instances.
pub struct StaticResolver {
    known: Vec<Instance>,
}

impl StaticResolver {
    pub fn new(known: Vec<Instance>) -> Self {
        Self { known }
    }
}

impl AssociationResolver for StaticResolver {
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
        self.known
            .iter()
            .find(|i| {
                i.entity_type() == target.name
                    && i.value(&target.id_property).to_key_string().as_deref() == Some(id)
            })
            .cloned()
    }
}

pub fn engine() -> PatchEngine {
    PatchEngine::new(
        Arc::new(registry()),
        Arc::new(StaticResolver::new(vec![
            dept(9, "Eng"),
            dept(10, "Ops"),
            Instance::new("Person").with("id", 2).with("name", "Bob"),
        ])),
    )
}

pub fn engine_with(config: PatchConfig) -> PatchEngine {
    engine().with_config(config)
}

pub fn dept(id: i64, name: &str) -> Instance {
    Instance::new("Dept").with("id", id).with("name", name)
}

pub fn ann() -> Instance {
    Instance::new("Person")
        .with("id", 1)
        .with("version", 3)
        .with("name", "Ann")
        .with("age", 41)
        .with("password", "secret")
        .with("createdBy", "admin")
        .with("tags", Value::List(vec!["a".into(), "b".into()]))
        .with("dept", dept(9, "Eng"))
}
