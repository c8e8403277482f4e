//! Shared fixtures for assembly tests.

#![allow(dead_code)]

use datarest_hal::{AssemblerConfig, ResourceAssembler};
use datarest_model::{
    EntityRegistry, ExcerptProjector, Instance, NoExcerpts, PersistentEntity, PersistentProperty,
    PropertyExcerpts, RequestContext, Value,
};
use std::sync::Arc;

pub const BASE: &str = "http://localhost:8080/api";

pub fn context() -> RequestContext {
    RequestContext::new(BASE)
}

/// Person ↔ Dept model with scalar, collection and map associations.
pub fn registry() -> EntityRegistry {
    EntityRegistry::new()
        .with(
            PersistentEntity::new("Person", "people", "id")
                .with_version("version")
                .with_last_modified("modified")
                .with_property(PersistentProperty::text("name"))
                .with_property(PersistentProperty::text("password").hidden())
                .with_property(PersistentProperty::text("createdBy").protected())
                .with_property(PersistentProperty::to_one("dept", "Dept"))
                .with_property(PersistentProperty::to_many("friends", "Person"))
                .with_property(PersistentProperty::to_map("roles", "Dept"))
                .with_property(PersistentProperty::to_one("vault", "Vault")),
        )
        .unwrap()
        .with(
            PersistentEntity::new("Dept", "depts", "id")
                .with_property(PersistentProperty::text("name"))
                .with_property(PersistentProperty::integer("budget"))
                .with_property(PersistentProperty::to_many("members", "Person")),
        )
        .unwrap()
        .with(
            PersistentEntity::new("Vault", "vaults", "id")
                .with_property(PersistentProperty::text("label"))
                .unexported(),
        )
        .unwrap()
}

pub fn assembler() -> ResourceAssembler {
    assembler_with(NoExcerpts)
}

pub fn assembler_with(projector: impl ExcerptProjector + 'static) -> ResourceAssembler {
    ResourceAssembler::new(Arc::new(registry()), Arc::new(projector))
}

pub fn exposing_ids(assembler: ResourceAssembler) -> ResourceAssembler {
    assembler.with_config(AssemblerConfig { expose_ids: true })
}

pub fn dept_excerpts() -> PropertyExcerpts {
    PropertyExcerpts::new().with("Dept", &["id", "name"])
}

pub fn dept(id: i64, name: &str) -> Instance {
    Instance::new("Dept")
        .with("id", id)
        .with("name", name)
        .with("budget", 1000)
}

pub fn ann() -> Instance {
    Instance::new("Person")
        .with("id", 1)
        .with("version", 5)
        .with("name", "Ann")
        .with("dept", dept(9, "Eng"))
}

pub fn people(instances: Vec<Instance>) -> Value {
    Value::List(instances.into_iter().map(Value::entity).collect())
}
