//! Request handling over a [`Dataset`]: rendering, paging and writes.

use crate::config::DatarestConfig;
use crate::dataset::{Dataset, parse_id};
use anyhow::{Context, Result};
use datarest_hal::{
    ConditionalRequestEvaluator, HalError, Pagination, RepresentationShape, ResourceAssembler,
};
use datarest_model::{
    EntityRegistry, Instance, MetadataProvider, PersistentEntity, PropertyAuditing,
    RequestContext,
};
use datarest_patch::{PatchEngine, PatchError, PatchStrategy};
use datarest_types::{HttpDate, PageMetadata};
use serde_json::Value as Json;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const HAL_MEDIA_TYPE: &str = "application/hal+json";

/// Conditional request headers supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct Preconditions {
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<HttpDate>,
    pub if_match: Option<String>,
}

/// A rendered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Response {
    fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    fn headers(mut self, pairs: Vec<(&'static str, String)>) -> Self {
        for (name, value) in pairs {
            self.headers.push((name.to_string(), value));
        }
        self
    }

    fn body(mut self, body: String) -> Self {
        self.body = body;
        self
    }

    fn error(status: u16, message: impl fmt::Display) -> Self {
        let body = serde_json::json!({ "status": status, "message": message.to_string() });
        Self::new(status)
            .header("Content-Type", "application/json")
            .body(body.to_string())
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn hal_status(err: &HalError) -> u16 {
    match err {
        HalError::ResourceNotFound(_) => 404,
        HalError::PreconditionFailed { .. } => 412,
        HalError::AmbiguousAssociationRel { .. } | HalError::Metadata(_) => 500,
        HalError::Serialization(_) => 500,
    }
}

fn patch_status(err: &PatchError) -> u16 {
    match err {
        PatchError::ResourceNotFound(_) => 404,
        PatchError::UnresolvablePropertyPath { .. }
        | PatchError::TypeConversionFailure { .. }
        | PatchError::MalformedPatchDocument(_)
        | PatchError::MissingTarget(_) => 400,
        PatchError::TestOperationFailed { .. } => 409,
        PatchError::Serialization(_) => 500,
    }
}

/// Resource service over an in-memory dataset.
pub struct DataRest {
    registry: Arc<EntityRegistry>,
    dataset: Dataset,
    context: RequestContext,
    assembler: ResourceAssembler,
    evaluator: ConditionalRequestEvaluator,
    config: DatarestConfig,
}

impl DataRest {
    pub fn new(config: DatarestConfig, registry: EntityRegistry, data: &Json) -> Result<Self> {
        let registry = Arc::new(registry);
        let context = RequestContext::new(config.base_uri.as_str());
        let dataset = Dataset::load(registry.clone(), &context, data)?;
        let assembler = ResourceAssembler::new(registry.clone(), Arc::new(config.projector()))
            .with_config(config.assembler.clone());
        let evaluator =
            ConditionalRequestEvaluator::new(Arc::new(PropertyAuditing::new(registry.clone())));

        Ok(Self {
            registry,
            dataset,
            context,
            assembler,
            evaluator,
            config,
        })
    }

    /// Reads the configuration, metadata and data files.
    pub fn open(config_path: &Path, metadata_path: &Path, data_path: &Path) -> Result<Self> {
        let config = DatarestConfig::load_from(config_path);

        let metadata = std::fs::read_to_string(metadata_path)
            .with_context(|| format!("failed to read metadata file {}", metadata_path.display()))?;
        let registry = EntityRegistry::from_json(&metadata)
            .with_context(|| format!("invalid metadata in {}", metadata_path.display()))?;

        let data = std::fs::read_to_string(data_path)
            .with_context(|| format!("failed to read data file {}", data_path.display()))?;
        let data: Json = serde_json::from_str(&data)
            .with_context(|| format!("invalid JSON in {}", data_path.display()))?;

        let service = Self::new(config, registry, &data)?;
        info!(
            "Opened {} entity types with {} instances",
            service.registry.len(),
            service.dataset.len()
        );
        Ok(service)
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn config(&self) -> &DatarestConfig {
        &self.config
    }

    /// Renders one item in the requested shape, honouring `If-None-Match`
    /// and `If-Modified-Since`.
    pub fn show(
        &self,
        uri: &str,
        shape: RepresentationShape,
        preconditions: &Preconditions,
    ) -> Response {
        let (entity, instance) = match self.locate(uri) {
            Ok(Some(found)) => found,
            Ok(None) => return Response::error(404, format!("no resource at {uri}")),
            Err(response) => return response,
        };

        let outcome = self.evaluator.evaluate(
            preconditions.if_none_match.as_deref(),
            preconditions.if_modified_since,
            instance,
            entity,
        );
        if !outcome.modified {
            debug!("{} not modified", uri);
            return Response::new(304).headers(outcome.headers.to_header_pairs());
        }

        match self.assembler.to_representation(&self.context, instance, shape) {
            Ok(representation) => Response::new(200)
                .header("Content-Type", shape.media_type())
                .headers(outcome.headers.to_header_pairs())
                .body(representation.to_body()),
            Err(e) => Response::error(hal_status(&e), e),
        }
    }

    /// Renders the JSON schema of an entity type.
    pub fn schema(&self, collection: &str) -> Response {
        let Some(entity) = self.registry.entity_for_collection(collection.trim_matches('/')) else {
            return Response::error(404, format!("no collection named {collection}"));
        };
        match self.assembler.to_schema(&entity.name) {
            Ok(schema) => Response::new(200)
                .header("Content-Type", RepresentationShape::Schema.media_type())
                .body(schema.to_string()),
            Err(e) => Response::error(hal_status(&e), e),
        }
    }

    /// Renders a page of a collection; without `page` the whole collection
    /// is rendered unpaged.
    pub fn list(&self, collection: &str, page: Option<(u64, u64)>) -> Response {
        let Some(entity) = self.registry.entity_for_collection(collection.trim_matches('/')) else {
            return Response::error(404, format!("no collection named {collection}"));
        };
        let all = self.dataset.all(&entity.name);

        let (items, pagination) = match page {
            Some((_, 0)) => return Response::error(400, "page size must be positive"),
            Some((number, size)) => {
                let pagination = self.paginate(entity, all.len() as u64, number, size);
                let start = usize::try_from(number.saturating_mul(size))
                    .unwrap_or(usize::MAX)
                    .min(all.len());
                let end = start
                    .saturating_add(usize::try_from(size).unwrap_or(usize::MAX))
                    .min(all.len());
                (&all[start..end], Some(pagination))
            }
            None => (all, None),
        };

        match self
            .assembler
            .to_collection(&self.context, &entity.name, items, pagination)
        {
            Ok(resource) => Response::new(200)
                .header("Content-Type", HAL_MEDIA_TYPE)
                .body(resource.to_hal().to_string()),
            Err(e) => Response::error(hal_status(&e), e),
        }
    }

    fn paginate(&self, entity: &PersistentEntity, total: u64, number: u64, size: u64) -> Pagination {
        let total_pages = total.div_ceil(size);
        let metadata = PageMetadata::new(size, number, total, total_pages);
        let href = self.context.collection_href(entity);
        let page_href = |n: u64| format!("{href}?page={n}&size={size}");

        let mut pagination = Pagination::new(metadata);
        if metadata.has_previous() {
            pagination = pagination.with_prev(page_href(number - 1));
        }
        if let Some(next) = number.checked_add(1).filter(|_| metadata.has_next()) {
            pagination = pagination.with_next(page_href(next));
        }
        pagination
    }

    /// Applies a payload to the item at `uri` and stores the result.
    ///
    /// PUT to an unknown item creates it under the identifier in the URI.
    pub fn update(
        &mut self,
        uri: &str,
        strategy: PatchStrategy,
        payload: &Json,
        preconditions: &Preconditions,
    ) -> Response {
        let (entity, existing) = match self.locate(uri) {
            Ok(Some((entity, instance))) => (entity.clone(), Some(instance.clone())),
            Ok(None) if strategy == PatchStrategy::Put => match self.entity_for_uri(uri) {
                Ok(entity) => (entity.clone(), None),
                Err(response) => return response,
            },
            Ok(None) => return Response::error(404, format!("no resource at {uri}")),
            Err(response) => return response,
        };

        if let Some(existing) = &existing {
            if let Err(e) = self.evaluator.verify_if_match(
                preconditions.if_match.as_deref(),
                existing,
                &entity,
            ) {
                warn!("Rejected {} to {}: {}", strategy, uri, e);
                return Response::error(hal_status(&e), e);
            }
        }

        let engine = PatchEngine::new(self.registry.clone(), Arc::new(self.dataset.clone()))
            .with_config(self.config.patch.clone());
        let mut updated =
            match engine.apply(&self.context, strategy, &entity.name, existing.as_ref(), payload) {
                Ok(updated) => updated,
                Err(e) => {
                    warn!("Rejected {} to {}: {}", strategy, uri, e);
                    return Response::error(patch_status(&e), e);
                }
            };

        let created = existing.is_none();
        if created {
            let id = match self
                .context
                .split_item_uri(uri)
                .context("missing identifier")
                .and_then(|(_, id)| parse_id(&entity, id))
            {
                Ok(id) => id,
                Err(e) => return Response::error(400, format!("{e:#}")),
            };
            updated.set(&entity.id_property, id);
        }

        let saved = self.dataset.save(&self.registry, &entity, updated);
        info!("{} {} via {}", if created { "Created" } else { "Updated" }, uri, strategy);

        let headers = self.evaluator.prepare_headers(&saved, &entity);
        let status = if created { 201 } else { 200 };
        match self.assembler.to_full(&self.context, &saved) {
            Ok(resource) => {
                let mut response = Response::new(status)
                    .header("Content-Type", HAL_MEDIA_TYPE)
                    .headers(headers.to_header_pairs())
                    .body(resource.to_hal().to_string());
                if created {
                    if let Some(link) = resource.self_link() {
                        response = response.header("Location", link.href());
                    }
                }
                response
            }
            Err(e) => Response::error(hal_status(&e), e),
        }
    }

    fn entity_for_uri(&self, uri: &str) -> Result<&PersistentEntity, Response> {
        let (collection, _) = self
            .context
            .split_item_uri(uri)
            .ok_or_else(|| Response::error(400, format!("{uri} is not an item URI")))?;
        self.registry
            .entity_for_collection(collection)
            .filter(|entity| entity.exported)
            .ok_or_else(|| Response::error(404, format!("no collection named {collection}")))
    }

    fn locate(&self, uri: &str) -> Result<Option<(&PersistentEntity, &Instance)>, Response> {
        let entity = self.entity_for_uri(uri)?;
        let found = self
            .context
            .split_item_uri(uri)
            .and_then(|(_, id)| self.dataset.find(entity, id));
        Ok(found.map(|instance| (entity, instance)))
    }
}
