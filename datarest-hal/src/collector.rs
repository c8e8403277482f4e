//! Association link collection.
//!
//! For every exported, linkable association of an entity the collector
//! decides between a link to the association resource and an embedded
//! excerpt of the target, never both.

use crate::error::{HalError, HalResult};
use crate::resource::{Embedded, EmbeddedResources, Resource};
use datarest_model::{
    ExcerptProjector, Instance, MetadataProvider, PersistentEntity, PersistentProperty,
    RequestContext, SelfLinkProvider, Value,
};
use datarest_types::{Link, Links, NEXT_REL, PREV_REL, SELF_REL};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Whether associations may be embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedMode {
    /// Embed targets that have an excerpt projection; link the rest.
    Excerpts,
    /// Link every association. Used for embedded resources themselves.
    LinksOnly,
}

/// Output of [`AssociationLinkCollector::collect`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedAssociations {
    pub links: Links,
    pub embeds: EmbeddedResources,
}

/// Derives association links and embedded excerpts from entity metadata.
#[derive(Clone)]
pub struct AssociationLinkCollector {
    metadata: Arc<dyn MetadataProvider>,
    projector: Arc<dyn ExcerptProjector>,
    self_links: SelfLinkProvider,
}

impl AssociationLinkCollector {
    pub fn new(metadata: Arc<dyn MetadataProvider>, projector: Arc<dyn ExcerptProjector>) -> Self {
        let self_links = SelfLinkProvider::new(metadata.clone());
        Self {
            metadata,
            projector,
            self_links,
        }
    }

    /// Collects links and embeds for `instance`, whose self link is
    /// `self_href`.
    ///
    /// Properties are visited in declaration order. Null scalars and empty
    /// collections or maps produce nothing.
    pub fn collect(
        &self,
        context: &RequestContext,
        instance: &Instance,
        entity: &PersistentEntity,
        self_href: &str,
        mode: EmbedMode,
    ) -> HalResult<CollectedAssociations> {
        let mut collected = CollectedAssociations::default();

        for property in self.linkable(entity)? {
            let rel = entity.association_rel(property);
            let targets = association_targets(property, instance.value(&property.name));
            if targets.is_empty() {
                continue;
            }

            if mode == EmbedMode::Excerpts && self.embeddable(&targets) {
                let embedded = self.embed(context, property, instance, &targets)?;
                collected.embeds.insert(rel, embedded);
            } else {
                collected
                    .links
                    .push(Link::new(self_href, rel).slash(&property.name));
            }
        }

        debug!(
            "Collected {} association links and {} embeds for {}",
            collected.links.len(),
            collected.embeds.len(),
            entity.name
        );
        Ok(collected)
    }

    /// One link per referenced target, pointing at the target's own self
    /// link and carrying the association's relation.
    ///
    /// Map entries contribute one link per value.
    pub fn collect_nested(
        &self,
        context: &RequestContext,
        instance: &Instance,
        entity: &PersistentEntity,
    ) -> HalResult<Links> {
        let mut links = Links::new();

        for property in self.linkable(entity)? {
            let rel = entity.association_rel(property);
            for (_, target) in association_targets(property, instance.value(&property.name)) {
                if let Some(target) = target.as_entity() {
                    let href = self.self_links.self_href(context, target)?;
                    links.push(Link::new(href, rel.clone()));
                }
            }
        }

        Ok(links)
    }

    /// Exported, linkable associations in declaration order.
    ///
    /// Fails when two of them resolve to the same relation, or when one
    /// claims a relation the assembler reserves for itself.
    fn linkable<'e>(&self, entity: &'e PersistentEntity) -> HalResult<Vec<&'e PersistentProperty>> {
        let mut rels: HashSet<String> = [SELF_REL, PREV_REL, NEXT_REL]
            .into_iter()
            .map(String::from)
            .collect();
        let mut properties = Vec::new();

        for property in entity.associations() {
            if !self.metadata.is_linkable(property) {
                continue;
            }
            let rel = entity.association_rel(property);
            if !rels.insert(rel.clone()) {
                return Err(HalError::AmbiguousAssociationRel {
                    entity_type: entity.name.clone(),
                    rel,
                });
            }
            properties.push(property);
        }

        Ok(properties)
    }

    /// Embedding requires a projection for the runtime type of every target.
    fn embeddable(&self, targets: &[(Option<&Value>, &Value)]) -> bool {
        targets.iter().all(|(_, target)| {
            target
                .as_entity()
                .is_some_and(|t| self.projector.has_excerpt_projection(t.entity_type()))
        })
    }

    fn embed(
        &self,
        context: &RequestContext,
        property: &PersistentProperty,
        owner: &Instance,
        targets: &[(Option<&Value>, &Value)],
    ) -> HalResult<Embedded> {
        let mut resources = Vec::with_capacity(targets.len());
        for (_, target) in targets {
            let target = target.as_entity().ok_or_else(|| {
                HalError::Metadata(format!(
                    "association {}.{} does not hold an entity",
                    owner.entity_type(),
                    property.name
                ))
            })?;
            resources.push(self.excerpt_resource(context, target)?);
        }

        if property.is_map() {
            let mut entries = Vec::with_capacity(resources.len());
            for ((key, _), resource) in targets.iter().zip(resources) {
                let key = key.map(|k| self.key_string(context, k)).transpose()?;
                entries.push((key.unwrap_or_default(), resource));
            }
            return Ok(Embedded::Keyed(entries));
        }

        if property.is_collection() {
            return Ok(Embedded::Many(resources));
        }

        resources
            .into_iter()
            .next()
            .map(Embedded::One)
            .ok_or_else(|| HalError::Metadata(format!("association {} is empty", property.name)))
    }

    /// The target's excerpt with its self link and association links.
    fn excerpt_resource(&self, context: &RequestContext, target: &Instance) -> HalResult<Resource> {
        let entity = self.metadata.required_entity(target.entity_type())?;
        let self_href = self.self_links.self_href(context, target)?;
        let content = self
            .projector
            .project_excerpt(target)
            .unwrap_or(serde_json::Value::Null);

        let mut links = Links::new();
        links.push(Link::self_link(self_href.clone()));
        let nested = self.collect(context, target, entity, &self_href, EmbedMode::LinksOnly)?;
        links.extend(nested.links);

        Ok(Resource::new(
            target.entity_type(),
            content,
            links,
            EmbeddedResources::new(),
        ))
    }

    /// String form of a map key: an entity key becomes its self link, any
    /// other key its natural string form.
    fn key_string(&self, context: &RequestContext, key: &Value) -> HalResult<String> {
        if let Some(entity) = key.as_entity() {
            return Ok(self.self_links.self_href(context, entity)?);
        }
        Ok(key
            .to_key_string()
            .unwrap_or_else(|| key.to_json().to_string()))
    }
}

/// Non-null targets of an association value, with their map keys.
fn association_targets<'v>(
    property: &PersistentProperty,
    value: &'v Value,
) -> Vec<(Option<&'v Value>, &'v Value)> {
    match value {
        Value::Null => Vec::new(),
        Value::List(items) if !property.is_map() => items
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| (None, v))
            .collect(),
        Value::Map(entries) => entries
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (Some(k), v))
            .collect(),
        other => vec![(None, other)],
    }
}
