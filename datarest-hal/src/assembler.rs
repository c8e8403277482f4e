//! Resource assembly.

use crate::collector::{AssociationLinkCollector, EmbedMode};
use crate::error::{HalError, HalResult};
use crate::resource::{CollectionContent, CollectionResource, Resource};
use crate::schema::entity_schema;
use crate::shape::{Representation, RepresentationShape};
use datarest_model::{
    ExcerptProjector, Instance, MetadataProvider, PersistentEntity, RequestContext,
    SelfLinkProvider,
};
use datarest_types::{Link, Links, NEXT_REL, PREV_REL, PageMetadata};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::sync::Arc;
use tracing::debug;

/// Assembly settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblerConfig {
    /// Include the identifier property in resource content.
    #[serde(default)]
    pub expose_ids: bool,
}

/// Paging information and pre-computed neighbour URIs for a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: PageMetadata,
    pub prev: Option<String>,
    pub next: Option<String>,
}

impl Pagination {
    pub fn new(page: PageMetadata) -> Self {
        Self {
            page,
            prev: None,
            next: None,
        }
    }

    #[must_use]
    pub fn with_prev(mut self, href: impl Into<String>) -> Self {
        self.prev = Some(href.into());
        self
    }

    #[must_use]
    pub fn with_next(mut self, href: impl Into<String>) -> Self {
        self.next = Some(href.into());
        self
    }
}

/// Composes content, self link, association links and embedded excerpts
/// into [`Resource`]s.
#[derive(Clone)]
pub struct ResourceAssembler {
    metadata: Arc<dyn MetadataProvider>,
    projector: Arc<dyn ExcerptProjector>,
    self_links: SelfLinkProvider,
    collector: AssociationLinkCollector,
    config: AssemblerConfig,
}

impl ResourceAssembler {
    pub fn new(metadata: Arc<dyn MetadataProvider>, projector: Arc<dyn ExcerptProjector>) -> Self {
        Self {
            self_links: SelfLinkProvider::new(metadata.clone()),
            collector: AssociationLinkCollector::new(metadata.clone(), projector.clone()),
            metadata,
            projector,
            config: AssemblerConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: AssemblerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// The untruncated instance plus links and embedded excerpts.
    pub fn to_full(&self, context: &RequestContext, instance: &Instance) -> HalResult<Resource> {
        let entity = self.exported_entity(instance.entity_type())?;
        let content = self.materialize_content(entity, instance);
        self.assemble(context, instance, entity, content)
    }

    /// The excerpt projection when one is registered for the instance's type,
    /// otherwise the full content. Links and embeds are the same as for
    /// [`Self::to_full`].
    pub fn to_summary(&self, context: &RequestContext, instance: &Instance) -> HalResult<Resource> {
        let entity = self.exported_entity(instance.entity_type())?;
        let content = if self.projector.has_excerpt_projection(instance.entity_type()) {
            self.projector
                .project_excerpt(instance)
                .unwrap_or_else(|| self.materialize_content(entity, instance))
        } else {
            self.materialize_content(entity, instance)
        };
        self.assemble(context, instance, entity, content)
    }

    /// Assembles the representation selected by `shape`.
    pub fn to_representation(
        &self,
        context: &RequestContext,
        instance: &Instance,
        shape: RepresentationShape,
    ) -> HalResult<Representation> {
        match shape {
            RepresentationShape::Full => self.to_full(context, instance).map(Representation::Resource),
            RepresentationShape::Summary => {
                self.to_summary(context, instance).map(Representation::Resource)
            }
            RepresentationShape::Compact => self.to_uri_list(context, instance).map(Representation::UriList),
            RepresentationShape::Schema => self.to_schema(instance.entity_type()).map(Representation::Schema),
        }
    }

    /// The self link followed by one link per associated target.
    pub fn to_uri_list(&self, context: &RequestContext, instance: &Instance) -> HalResult<Links> {
        let entity = self.exported_entity(instance.entity_type())?;
        let mut links = Links::new().and(self.self_links.self_link(context, instance)?);
        links.extend(self.collector.collect_nested(context, instance, entity)?);
        Ok(links)
    }

    /// JSON-Schema style description of an exported entity type.
    pub fn to_schema(&self, entity_type: &str) -> HalResult<Json> {
        let entity = self.exported_entity(entity_type)?;
        Ok(entity_schema(
            self.metadata.as_ref(),
            entity,
            self.config.expose_ids,
        ))
    }

    /// Assembles a collection of `entity_type` instances as summaries.
    ///
    /// An empty input yields an explicit empty marker. The collection always
    /// carries a self link to its endpoint; `prev`/`next` links and page
    /// metadata are attached as supplied.
    pub fn to_collection(
        &self,
        context: &RequestContext,
        entity_type: &str,
        instances: &[Instance],
        pagination: Option<Pagination>,
    ) -> HalResult<CollectionResource> {
        let entity = self.exported_entity(entity_type)?;

        let mut links = Links::new().and(Link::self_link(context.collection_href(entity)));

        let page = pagination.map(|p| {
            if let Some(prev) = p.prev {
                links.push(Link::new(prev, PREV_REL));
            }
            if let Some(next) = p.next {
                links.push(Link::new(next, NEXT_REL));
            }
            p.page
        });

        if instances.is_empty() {
            debug!("Assembled empty {} collection", entity.name);
            return Ok(CollectionResource::new(
                entity.collection_rel(),
                CollectionContent::Empty,
                links,
                page,
            ));
        }

        let items = instances
            .iter()
            .map(|instance| self.to_summary(context, instance))
            .collect::<HalResult<Vec<_>>>()?;

        debug!("Assembled {} collection with {} items", entity.name, items.len());
        Ok(CollectionResource::new(
            entity.collection_rel(),
            CollectionContent::Items(items),
            links,
            page,
        ))
    }

    /// Exported, non-association properties in declaration order.
    ///
    /// The identifier is included only when `expose_ids` is set.
    pub fn materialize_content(&self, entity: &PersistentEntity, instance: &Instance) -> Json {
        let mut content = Map::new();
        for property in &entity.properties {
            if !property.exported || property.is_association() {
                continue;
            }
            if entity.is_id(&property.name) && !self.config.expose_ids {
                continue;
            }
            content.insert(property.name.clone(), instance.value(&property.name).to_json());
        }
        Json::Object(content)
    }

    fn assemble(
        &self,
        context: &RequestContext,
        instance: &Instance,
        entity: &PersistentEntity,
        content: Json,
    ) -> HalResult<Resource> {
        let self_href = self.self_links.self_href(context, instance)?;
        let collected =
            self.collector
                .collect(context, instance, entity, &self_href, EmbedMode::Excerpts)?;

        let mut links = Links::new().and(Link::self_link(self_href));
        links.extend(collected.links);

        Ok(Resource::new(
            &entity.name,
            content,
            links,
            collected.embeds,
        ))
    }

    fn exported_entity(&self, entity_type: &str) -> HalResult<&PersistentEntity> {
        let entity = self.metadata.required_entity(entity_type)?;
        if !entity.exported {
            return Err(HalError::ResourceNotFound(format!(
                "{entity_type} is not exported"
            )));
        }
        Ok(entity)
    }
}
