use crate::value::Value;
use serde_json::Map;
use std::collections::BTreeMap;

/// A live instance of a runtime-described entity type.
///
/// Holds the type name and a value per property. Absent properties read as
/// [`Value::Null`]. Metadata (declaration order, export flags) lives in the
/// type's [`crate::PersistentEntity`], not here.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    entity_type: String,
    values: BTreeMap<String, Value>,
}

impl Instance {
    /// Creates an instance with no property values set.
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            values: BTreeMap::new(),
        }
    }

    /// Returns this instance with a property set. Builder form of [`Instance::set`].
    #[must_use]
    pub fn with(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.set(property, value);
        self
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Returns the stored value, or `None` if the property was never set.
    pub fn get(&self, property: &str) -> Option<&Value> {
        self.values.get(property)
    }

    /// Returns the stored value, treating absent properties as null.
    pub fn value(&self, property: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.values.get(property).unwrap_or(&NULL)
    }

    pub fn set(&mut self, property: &str, value: impl Into<Value>) {
        self.values.insert(property.to_string(), value.into());
    }

    pub fn remove(&mut self, property: &str) -> Option<Value> {
        self.values.remove(property)
    }

    /// Extract a text value.
    pub fn get_str(&self, property: &str) -> Option<&str> {
        self.value(property).as_str()
    }

    /// Extract an integer value.
    pub fn get_i64(&self, property: &str) -> Option<i64> {
        self.value(property).as_i64()
    }

    /// Extract a referenced entity.
    pub fn get_entity(&self, property: &str) -> Option<&Instance> {
        self.value(property).as_entity()
    }

    /// Renders every stored value as JSON without consulting metadata.
    ///
    /// Used for diagnostics and for values that hold entities outside an
    /// association property.
    pub fn to_raw_json(&self) -> serde_json::Value {
        let map: Map<String, serde_json::Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}
