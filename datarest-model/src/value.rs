//! Dynamic property values.

use crate::instance::Instance;
use crate::schema::ValueType;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number};

/// A property value of an [`Instance`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Decimal(f64),
    Text(String),
    DateTime(DateTime<Utc>),
    /// A free-form nested tree.
    Tree(serde_json::Value),
    List(Vec<Value>),
    /// Ordered key/value pairs. Keys are scalars or entity references.
    Map(Vec<(Value, Value)>),
    /// A reference to another managed entity.
    Entity(Box<Instance>),
}

/// A JSON value could not be coerced to a declared [`ValueType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    pub expected: ValueType,
    pub found: String,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Instance> {
        match self {
            Value::Entity(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Creates an entity reference.
    pub fn entity(instance: Instance) -> Self {
        Value::Entity(Box::new(instance))
    }

    /// Natural string conversion of a scalar value.
    ///
    /// Used for identifiers in URIs and for map keys. Containers, trees and
    /// entity references have no natural string form.
    pub fn to_key_string(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Integer(n) => Some(n.to_string()),
            Value::Decimal(d) => Some(d.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::DateTime(dt) => Some(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Tree(serde_json::Value::String(s)) => Some(s.clone()),
            Value::Tree(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Renders the value as plain JSON.
    ///
    /// Entity references render as their raw property maps; callers that need
    /// links instead (materialization, assembly) handle entities themselves.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(n) => serde_json::Value::Number((*n).into()),
            Value::Decimal(d) => Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::DateTime(dt) => {
                serde_json::Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::Tree(tree) => tree.clone(),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    let key = key
                        .to_key_string()
                        .or_else(|| key.as_entity().map(|e| e.to_raw_json().to_string()))
                        .unwrap_or_default();
                    map.insert(key, value.to_json());
                }
                serde_json::Value::Object(map)
            }
            Value::Entity(instance) => instance.to_raw_json(),
        }
    }

    /// Coerces a JSON value to the declared scalar type.
    ///
    /// Null is accepted for every type. Numeric and boolean strings are
    /// accepted where unambiguous; integers are accepted as epoch
    /// milliseconds for date-times.
    pub fn from_json(json: &serde_json::Value, expected: ValueType) -> Result<Value, ConversionError> {
        use serde_json::Value as Json;

        let fail = || ConversionError {
            expected,
            found: describe(json),
        };

        if json.is_null() {
            return Ok(Value::Null);
        }

        match expected {
            ValueType::Text => match json {
                Json::String(s) => Ok(Value::Text(s.clone())),
                Json::Number(n) => Ok(Value::Text(n.to_string())),
                Json::Bool(b) => Ok(Value::Text(b.to_string())),
                _ => Err(fail()),
            },
            ValueType::Integer => match json {
                Json::Number(n) => n.as_i64().map(Value::Integer).ok_or_else(fail),
                Json::String(s) => s.trim().parse().map(Value::Integer).map_err(|_| fail()),
                _ => Err(fail()),
            },
            ValueType::Decimal => match json {
                Json::Number(n) => n.as_f64().map(Value::Decimal).ok_or_else(fail),
                Json::String(s) => s.trim().parse().map(Value::Decimal).map_err(|_| fail()),
                _ => Err(fail()),
            },
            ValueType::Boolean => match json {
                Json::Bool(b) => Ok(Value::Bool(*b)),
                Json::String(s) if s == "true" => Ok(Value::Bool(true)),
                Json::String(s) if s == "false" => Ok(Value::Bool(false)),
                _ => Err(fail()),
            },
            ValueType::DateTime => match json {
                Json::String(s) => DateTime::parse_from_rfc3339(s)
                    .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
                    .map_err(|_| fail()),
                Json::Number(n) => n
                    .as_i64()
                    .and_then(DateTime::<Utc>::from_timestamp_millis)
                    .map(Value::DateTime)
                    .ok_or_else(fail),
                _ => Err(fail()),
            },
            ValueType::Object => match json {
                Json::Object(_) => Ok(Value::Tree(json.clone())),
                _ => Err(fail()),
            },
            ValueType::Any => Ok(Value::Tree(json.clone())),
        }
    }
}

/// Short description of a JSON value for error messages.
fn describe(json: &serde_json::Value) -> String {
    match json {
        serde_json::Value::Null => "null".into(),
        serde_json::Value::Bool(b) => format!("boolean {b}"),
        serde_json::Value::Number(n) => format!("number {n}"),
        serde_json::Value::String(s) => format!("string \"{s}\""),
        serde_json::Value::Array(_) => "array".into(),
        serde_json::Value::Object(_) => "object".into(),
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Decimal(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value)
    }
}

impl From<Instance> for Value {
    fn from(value: Instance) -> Self {
        Value::entity(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
