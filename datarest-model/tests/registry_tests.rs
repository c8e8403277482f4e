use datarest_model::{EntityRegistry, MetadataProvider, ModelError, PersistentEntity, Value};

const DOCUMENT: &str = r#"{
    "entities": [
        {
            "name": "Person",
            "collection_path": "people",
            "id_property": "id",
            "version_property": "version",
            "properties": [
                {"name": "id", "value_type": "integer"},
                {"name": "version", "value_type": "integer"},
                {"name": "name", "value_type": "text"},
                {"name": "dept", "target": "Dept"}
            ]
        },
        {
            "name": "Dept",
            "collection_path": "depts",
            "id_property": "id",
            "properties": [{"name": "id", "value_type": "integer"}]
        }
    ]
}"#;

#[test]
fn loads_document() {
    let registry = EntityRegistry::from_json(DOCUMENT).unwrap();
    assert_eq!(registry.len(), 2);
    assert!(registry.entity("Person").is_some());
    assert_eq!(registry.entity_for_collection("depts").map(|e| e.name.as_str()), Some("Dept"));
}

#[test]
fn rejects_invalid_descriptor_in_document() {
    let broken = DOCUMENT.replace("\"version_property\": \"version\"", "\"version_property\": \"rev\"");
    assert!(matches!(
        EntityRegistry::from_json(&broken),
        Err(ModelError::InvalidMetadata { .. })
    ));
}

#[test]
fn rejects_malformed_json() {
    assert!(matches!(
        EntityRegistry::from_json("{"),
        Err(ModelError::Serialization(_))
    ));
}

#[test]
fn rejects_collection_path_clash() {
    let mut registry = EntityRegistry::new();
    registry.register(PersistentEntity::new("Person", "people", "id")).unwrap();
    let err = registry
        .register(PersistentEntity::new("Human", "people", "id"))
        .unwrap_err();
    assert!(err.to_string().contains("already used by Person"));
}

#[test]
fn re_registering_replaces() {
    let mut registry = EntityRegistry::new();
    registry.register(PersistentEntity::new("Person", "people", "id")).unwrap();
    registry
        .register(PersistentEntity::new("Person", "people", "id").with_version("v"))
        .unwrap();
    assert_eq!(registry.len(), 1);
    assert!(registry.entity("Person").unwrap().version().is_some());
}

#[test]
fn required_entity_reports_unknown() {
    let registry = EntityRegistry::new();
    let err = registry.required_entity("Ghost").unwrap_err();
    assert_eq!(err.to_string(), "unknown entity type: Ghost");
}

#[test]
fn default_id_to_string_uses_natural_form() {
    let registry = EntityRegistry::from_json(DOCUMENT).unwrap();
    let person = registry.entity("Person").unwrap();
    assert_eq!(registry.id_to_string(person, &Value::from(12)).as_deref(), Some("12"));
    assert_eq!(registry.id_to_string(person, &Value::from("ann")).as_deref(), Some("ann"));
    assert_eq!(registry.id_to_string(person, &Value::Null), None);
}
