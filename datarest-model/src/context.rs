use crate::error::{ModelError, ModelResult};
use crate::instance::Instance;
use crate::registry::MetadataProvider;
use crate::schema::PersistentEntity;
use datarest_types::Link;
use std::sync::Arc;

/// Per-request values threaded explicitly through assembly and binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    base_uri: String,
}

impl RequestContext {
    /// Creates a context; a trailing slash on the base URI is dropped.
    pub fn new(base_uri: impl Into<String>) -> Self {
        let base_uri: String = base_uri.into();
        Self {
            base_uri: base_uri.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// URI of the entity's collection resource.
    pub fn collection_href(&self, entity: &PersistentEntity) -> String {
        format!("{}/{}", self.base_uri, entity.collection_path)
    }

    /// Splits an item URI under this base into `(collection_path, id)`.
    ///
    /// Accepts absolute URIs under the base and relative `/collection/id`
    /// forms. Query strings and fragments are ignored.
    pub fn split_item_uri<'a>(&self, uri: &'a str) -> Option<(&'a str, &'a str)> {
        let path = uri.strip_prefix(self.base_uri.as_str()).unwrap_or(uri);
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let mut segments = path.trim_matches('/').split('/');
        let collection = segments.next().filter(|s| !s.is_empty())?;
        let id = segments.next().filter(|s| !s.is_empty())?;
        if segments.next().is_some() {
            return None;
        }
        Some((collection, id))
    }
}

/// Builds self links from entity identifiers.
#[derive(Clone)]
pub struct SelfLinkProvider {
    provider: Arc<dyn MetadataProvider>,
}

impl SelfLinkProvider {
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self { provider }
    }

    /// `<base>/<collection>/<id>` for the instance.
    ///
    /// Fails when the type is unknown or the identifier is null.
    pub fn self_href(&self, context: &RequestContext, instance: &Instance) -> ModelResult<String> {
        let entity = self.provider.required_entity(instance.entity_type())?;
        let id = instance.value(&entity.id_property);
        let missing = || ModelError::MissingIdentifier {
            entity_type: entity.name.clone(),
        };

        if id.is_null() {
            return Err(missing());
        }

        let id = self.provider.id_to_string(entity, id).ok_or_else(missing)?;
        Ok(format!("{}/{}", context.collection_href(entity), id))
    }

    pub fn self_link(&self, context: &RequestContext, instance: &Instance) -> ModelResult<Link> {
        self.self_href(context, instance).map(Link::self_link)
    }
}
