use crate::error::{ModelError, ModelResult};
use datarest_types::{NEXT_REL, PREV_REL, SELF_REL};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// The declared type of a property value (or of its elements, for
/// collection and map properties).
///
/// Association properties carry their target type separately in
/// [`PersistentProperty::target`]; their `value_type` is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Text,
    Integer,
    Decimal,
    Boolean,
    DateTime,
    /// A free-form nested object.
    Object,
    /// Any JSON value, stored verbatim.
    Any,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Text => "text",
            ValueType::Integer => "integer",
            ValueType::Decimal => "decimal",
            ValueType::Boolean => "boolean",
            ValueType::DateTime => "date-time",
            ValueType::Object => "object",
            ValueType::Any => "any",
        };
        f.write_str(name)
    }
}

/// How many values a property holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    #[default]
    Scalar,
    Collection,
    Map,
}

fn default_value_type() -> ValueType {
    ValueType::Any
}

fn default_true() -> bool {
    true
}

/// Describes one property of an entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentProperty {
    pub name: String,
    #[serde(default = "default_value_type")]
    pub value_type: ValueType,
    #[serde(default)]
    pub cardinality: Cardinality,
    /// Target entity type. `Some` makes this property an association.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Whether the property participates in the representation.
    #[serde(default = "default_true")]
    pub exported: bool,
    /// Server-managed; never written from client payloads.
    #[serde(default)]
    pub protected: bool,
    /// Relation name override for association links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
}

impl PersistentProperty {
    fn simple(name: &str, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            cardinality: Cardinality::Scalar,
            target: None,
            exported: true,
            protected: false,
            rel: None,
        }
    }

    /// Shorthand for a text property.
    pub fn text(name: &str) -> Self {
        Self::simple(name, ValueType::Text)
    }

    /// Shorthand for an integer property.
    pub fn integer(name: &str) -> Self {
        Self::simple(name, ValueType::Integer)
    }

    /// Shorthand for a decimal property.
    pub fn decimal(name: &str) -> Self {
        Self::simple(name, ValueType::Decimal)
    }

    /// Shorthand for a boolean property.
    pub fn boolean(name: &str) -> Self {
        Self::simple(name, ValueType::Boolean)
    }

    /// Shorthand for a UTC date-time property.
    pub fn date_time(name: &str) -> Self {
        Self::simple(name, ValueType::DateTime)
    }

    /// Shorthand for a free-form nested object property.
    pub fn object(name: &str) -> Self {
        Self::simple(name, ValueType::Object)
    }

    /// Shorthand for an untyped property.
    pub fn any(name: &str) -> Self {
        Self::simple(name, ValueType::Any)
    }

    /// Shorthand for a single-valued association.
    pub fn to_one(name: &str, target: &str) -> Self {
        Self {
            target: Some(target.into()),
            ..Self::simple(name, ValueType::Any)
        }
    }

    /// Shorthand for a collection-valued association.
    pub fn to_many(name: &str, target: &str) -> Self {
        Self::to_one(name, target).collection()
    }

    /// Shorthand for a map-valued association.
    pub fn to_map(name: &str, target: &str) -> Self {
        Self::to_one(name, target).map()
    }

    /// Marks the property as holding a collection of values.
    #[must_use]
    pub fn collection(mut self) -> Self {
        self.cardinality = Cardinality::Collection;
        self
    }

    /// Marks the property as holding a keyed map of values.
    #[must_use]
    pub fn map(mut self) -> Self {
        self.cardinality = Cardinality::Map;
        self
    }

    /// Marks the property as server-managed.
    #[must_use]
    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    /// Excludes the property from the representation.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.exported = false;
        self
    }

    /// Overrides the association relation name.
    #[must_use]
    pub fn with_rel(mut self, rel: &str) -> Self {
        self.rel = Some(rel.into());
        self
    }

    pub fn is_association(&self) -> bool {
        self.target.is_some()
    }

    pub fn is_collection(&self) -> bool {
        self.cardinality == Cardinality::Collection
    }

    pub fn is_map(&self) -> bool {
        self.cardinality == Cardinality::Map
    }
}

/// Describes an entity type: its identity, collection resource and properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentEntity {
    /// Type identity; also used as the simple name in relation names.
    pub name: String,
    /// URI segment of the collection resource (e.g. `people`).
    pub collection_path: String,
    /// Collection relation name; defaults to `collection_path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_rel: Option<String>,
    pub id_property: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_property: Option<String>,
    /// Date-time property read by [`crate::PropertyAuditing`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_property: Option<String>,
    #[serde(default = "default_true")]
    pub exported: bool,
    /// Properties in declaration order.
    #[serde(default)]
    pub properties: Vec<PersistentProperty>,
}

impl PersistentEntity {
    /// Creates an exported entity whose identifier is an integer property.
    pub fn new(name: &str, collection_path: &str, id_property: &str) -> Self {
        Self {
            name: name.into(),
            collection_path: collection_path.into(),
            collection_rel: None,
            id_property: id_property.into(),
            version_property: None,
            last_modified_property: None,
            exported: true,
            properties: vec![PersistentProperty::integer(id_property)],
        }
    }

    /// Appends a property declaration.
    #[must_use]
    pub fn with_property(mut self, property: PersistentProperty) -> Self {
        self.properties.retain(|p| p.name != property.name);
        self.properties.push(property);
        self
    }

    /// Replaces the identifier declaration (e.g. for text identifiers).
    #[must_use]
    pub fn with_id_property(mut self, property: PersistentProperty) -> Self {
        self.properties.retain(|p| p.name != self.id_property);
        self.id_property = property.name.clone();
        self.properties.insert(0, property);
        self
    }

    /// Declares an integer version property.
    #[must_use]
    pub fn with_version(mut self, name: &str) -> Self {
        self.version_property = Some(name.into());
        self.with_property(PersistentProperty::integer(name))
    }

    /// Declares a date-time last-modified property.
    #[must_use]
    pub fn with_last_modified(mut self, name: &str) -> Self {
        self.last_modified_property = Some(name.into());
        self.with_property(PersistentProperty::date_time(name))
    }

    #[must_use]
    pub fn with_collection_rel(mut self, rel: &str) -> Self {
        self.collection_rel = Some(rel.into());
        self
    }

    /// Hides the whole type from the representation.
    #[must_use]
    pub fn unexported(mut self) -> Self {
        self.exported = false;
        self
    }

    /// Simple name used in relation names.
    pub fn simple_name(&self) -> &str {
        &self.name
    }

    /// Relation of the collection resource.
    pub fn collection_rel(&self) -> &str {
        self.collection_rel.as_deref().unwrap_or(&self.collection_path)
    }

    pub fn property(&self, name: &str) -> Option<&PersistentProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Looks up a property, failing with [`ModelError::UnknownProperty`].
    pub fn required_property(&self, name: &str) -> ModelResult<&PersistentProperty> {
        self.property(name).ok_or_else(|| ModelError::UnknownProperty {
            entity_type: self.name.clone(),
            property: name.to_string(),
        })
    }

    pub fn id(&self) -> Option<&PersistentProperty> {
        self.property(&self.id_property)
    }

    pub fn version(&self) -> Option<&PersistentProperty> {
        self.version_property.as_deref().and_then(|v| self.property(v))
    }

    pub fn is_id(&self, name: &str) -> bool {
        self.id_property == name
    }

    pub fn is_version(&self, name: &str) -> bool {
        self.version_property.as_deref() == Some(name)
    }

    /// Identifier, version and protected properties are owned by the server.
    pub fn is_server_owned(&self, property: &PersistentProperty) -> bool {
        property.protected || self.is_id(&property.name) || self.is_version(&property.name)
    }

    /// Association properties in declaration order.
    pub fn associations(&self) -> impl Iterator<Item = &PersistentProperty> {
        self.properties.iter().filter(|p| p.is_association())
    }

    /// Relation name of an association property:
    /// `<collectionRel>.<EntitySimpleName>.<propertyName>` unless overridden.
    pub fn association_rel(&self, property: &PersistentProperty) -> String {
        match &property.rel {
            Some(rel) => rel.clone(),
            None => format!(
                "{}.{}.{}",
                self.collection_rel(),
                self.simple_name(),
                property.name
            ),
        }
    }

    /// Checks the structural invariants of the descriptor.
    pub fn validate(&self) -> ModelResult<()> {
        let invalid = |reason: String| ModelError::InvalidMetadata {
            entity_type: self.name.clone(),
            reason,
        };

        let mut seen = HashSet::new();
        for property in &self.properties {
            if !seen.insert(property.name.as_str()) {
                return Err(invalid(format!("duplicate property '{}'", property.name)));
            }
        }

        let id = self
            .id()
            .ok_or_else(|| invalid(format!("identifier '{}' is not declared", self.id_property)))?;
        if id.is_association() || id.cardinality != Cardinality::Scalar {
            return Err(invalid("identifier must be a scalar, non-association property".into()));
        }

        if let Some(version) = &self.version_property {
            if self.property(version).is_none() {
                return Err(invalid(format!("version '{version}' is not declared")));
            }
        }

        if let Some(last_modified) = &self.last_modified_property {
            if self.property(last_modified).is_none() {
                return Err(invalid(format!(
                    "last-modified '{last_modified}' is not declared"
                )));
            }
        }

        if self.collection_path.is_empty() || self.collection_path.contains('/') {
            return Err(invalid(format!(
                "collection path '{}' must be a single segment",
                self.collection_path
            )));
        }

        for property in self.associations() {
            let rel = self.association_rel(property);
            if [SELF_REL, PREV_REL, NEXT_REL].contains(&rel.as_str()) {
                return Err(invalid(format!(
                    "association '{}' uses reserved relation '{rel}'",
                    property.name
                )));
            }
        }

        Ok(())
    }
}
