//! Assembled resources and their HAL rendering.

use datarest_types::{Link, Links, PageMetadata};
use serde_json::{Map, Value as Json, json};

/// Content, links and embedded resources for one entity instance.
///
/// Always carries exactly one `self` link; the assembler guarantees it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    entity_type: String,
    content: Json,
    links: Links,
    embedded: EmbeddedResources,
}

impl Resource {
    pub(crate) fn new(
        entity_type: &str,
        content: Json,
        links: Links,
        embedded: EmbeddedResources,
    ) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            content,
            links,
            embedded,
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn content(&self) -> &Json {
        &self.content
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    pub fn embedded(&self) -> &EmbeddedResources {
        &self.embedded
    }

    /// The resource's `self` link.
    pub fn self_link(&self) -> Option<&Link> {
        self.links.self_link()
    }

    /// Renders `application/hal+json`.
    ///
    /// Object content is flattened into the top level; any other content is
    /// placed under `content`.
    pub fn to_hal(&self) -> Json {
        let mut out = match &self.content {
            Json::Object(map) => map.clone(),
            Json::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("content".into(), other.clone());
                map
            }
        };

        if !self.embedded.is_empty() {
            out.insert("_embedded".into(), self.embedded.to_hal());
        }
        out.insert("_links".into(), links_to_hal(&self.links));
        Json::Object(out)
    }
}

/// Renders links grouped by relation; repeated relations become arrays.
pub(crate) fn links_to_hal(links: &Links) -> Json {
    let mut out = Map::new();
    for rel in links.rels() {
        let hrefs: Vec<Json> = links.all(rel).map(|l| json!({ "href": l.href() })).collect();
        let rendered = if hrefs.len() == 1 {
            hrefs.into_iter().next().unwrap_or(Json::Null)
        } else {
            Json::Array(hrefs)
        };
        out.insert(rel.to_string(), rendered);
    }
    Json::Object(out)
}

/// An embedded association value.
#[derive(Debug, Clone, PartialEq)]
pub enum Embedded {
    /// A single-valued association.
    One(Resource),
    /// A collection-valued association, in collection order.
    Many(Vec<Resource>),
    /// A map-valued association keyed by the map key's string form.
    Keyed(Vec<(String, Resource)>),
}

impl Embedded {
    fn to_hal(&self) -> Json {
        match self {
            Embedded::One(r) => r.to_hal(),
            Embedded::Many(items) => Json::Array(items.iter().map(Resource::to_hal).collect()),
            Embedded::Keyed(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, r)| (k.clone(), r.to_hal()))
                    .collect(),
            ),
        }
    }
}

/// Embedded resources keyed by relation, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddedResources(Vec<(String, Embedded)>);

impl EmbeddedResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, rel: String, value: Embedded) {
        self.0.push((rel, value));
    }

    pub fn get(&self, rel: &str) -> Option<&Embedded> {
        self.0.iter().find(|(r, _)| r == rel).map(|(_, e)| e)
    }

    pub fn contains(&self, rel: &str) -> bool {
        self.get(rel).is_some()
    }

    pub fn rels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(r, _)| r.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Embedded)> {
        self.0.iter().map(|(r, e)| (r.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn to_hal(&self) -> Json {
        Json::Object(self.0.iter().map(|(r, e)| (r.clone(), e.to_hal())).collect())
    }
}

/// Items of a collection resource.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionContent {
    Items(Vec<Resource>),
    /// Explicit marker for a collection with no items.
    Empty,
}

/// A collection of resources plus collection-level links and page metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionResource {
    rel: String,
    content: CollectionContent,
    links: Links,
    page: Option<PageMetadata>,
}

impl CollectionResource {
    pub(crate) fn new(
        rel: &str,
        content: CollectionContent,
        links: Links,
        page: Option<PageMetadata>,
    ) -> Self {
        Self {
            rel: rel.to_string(),
            content,
            links,
            page,
        }
    }

    /// Relation of the collection (the entity's collection rel).
    pub fn rel(&self) -> &str {
        &self.rel
    }

    pub fn content(&self) -> &CollectionContent {
        &self.content
    }

    pub fn items(&self) -> &[Resource] {
        match &self.content {
            CollectionContent::Items(items) => items,
            CollectionContent::Empty => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.content, CollectionContent::Empty)
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    pub fn page(&self) -> Option<&PageMetadata> {
        self.page.as_ref()
    }

    /// Renders `application/hal+json`; an empty collection renders as an
    /// empty array under its relation.
    pub fn to_hal(&self) -> Json {
        let items: Vec<Json> = self.items().iter().map(Resource::to_hal).collect();
        let mut embedded = Map::new();
        embedded.insert(self.rel.clone(), Json::Array(items));

        let mut out = Map::new();
        out.insert("_embedded".into(), Json::Object(embedded));
        out.insert("_links".into(), links_to_hal(&self.links));
        if let Some(page) = &self.page {
            out.insert("page".into(), serde_json::to_value(page).unwrap_or(Json::Null));
        }
        Json::Object(out)
    }
}
