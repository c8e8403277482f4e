//! JSON-Schema style descriptions of entity types.

use datarest_model::{Cardinality, MetadataProvider, PersistentEntity, PersistentProperty, ValueType};
use serde_json::{Map, Value as Json, json};

/// Describes the representation of `entity` as a JSON Schema document.
///
/// Only exported properties appear. Associations are described as URI
/// strings, the form clients use to write them. Server-owned properties are
/// marked `readOnly`.
pub(crate) fn entity_schema(
    metadata: &dyn MetadataProvider,
    entity: &PersistentEntity,
    expose_ids: bool,
) -> Json {
    let mut properties = Map::new();

    for property in &entity.properties {
        if !property.exported {
            continue;
        }
        if entity.is_id(&property.name) && !expose_ids {
            continue;
        }
        if property.is_association() && !metadata.is_linkable(property) {
            continue;
        }

        let mut schema = element_schema(property);
        schema = match property.cardinality {
            Cardinality::Scalar => schema,
            Cardinality::Collection => json!({ "type": "array", "items": schema }),
            Cardinality::Map => json!({ "type": "object", "additionalProperties": schema }),
        };
        if entity.is_server_owned(property) {
            if let Json::Object(map) = &mut schema {
                map.insert("readOnly".into(), Json::Bool(true));
            }
        }
        properties.insert(property.name.clone(), schema);
    }

    json!({
        "$schema": "http://json-schema.org/draft-04/schema#",
        "title": entity.name,
        "type": "object",
        "properties": properties,
    })
}

fn element_schema(property: &PersistentProperty) -> Json {
    if property.is_association() {
        return json!({ "type": "string", "format": "uri" });
    }

    match property.value_type {
        ValueType::Text => json!({ "type": "string" }),
        ValueType::Integer => json!({ "type": "integer" }),
        ValueType::Decimal => json!({ "type": "number" }),
        ValueType::Boolean => json!({ "type": "boolean" }),
        ValueType::DateTime => json!({ "type": "string", "format": "date-time" }),
        ValueType::Object => json!({ "type": "object" }),
        ValueType::Any => json!({}),
    }
}
