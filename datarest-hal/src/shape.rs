use crate::resource::Resource;
use datarest_types::Links;
use serde_json::Value as Json;

/// The negotiated representation of a single entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RepresentationShape {
    /// Untruncated content, association links and embedded excerpts.
    #[default]
    Full,
    /// Excerpt content when a projection is registered, else full content.
    Summary,
    /// A flat list of URIs: the self link then the associated targets.
    Compact,
    /// A JSON-Schema style description of the entity type.
    Schema,
}

impl RepresentationShape {
    /// Maps an accepted media type to a shape.
    ///
    /// Parameters are ignored. Unrecognised types fall back to [`Self::Full`].
    pub fn from_media_type(media_type: &str) -> Self {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "text/uri-list" => RepresentationShape::Compact,
            "application/schema+json" => RepresentationShape::Schema,
            "application/x-excerpt+json" => RepresentationShape::Summary,
            _ => RepresentationShape::Full,
        }
    }

    /// The media type a response of this shape is rendered as.
    pub fn media_type(&self) -> &'static str {
        match self {
            RepresentationShape::Full | RepresentationShape::Summary => "application/hal+json",
            RepresentationShape::Compact => "text/uri-list",
            RepresentationShape::Schema => "application/schema+json",
        }
    }
}

/// An assembled representation in one of the [`RepresentationShape`]s.
#[derive(Debug, Clone, PartialEq)]
pub enum Representation {
    Resource(Resource),
    UriList(Links),
    Schema(Json),
}

impl Representation {
    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Representation::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    /// Renders the body: HAL JSON, a newline-separated URI list, or the
    /// schema document.
    pub fn to_body(&self) -> String {
        match self {
            Representation::Resource(resource) => resource.to_hal().to_string(),
            Representation::UriList(links) => links
                .iter()
                .map(|link| link.href())
                .collect::<Vec<_>>()
                .join("\n"),
            Representation::Schema(schema) => schema.to_string(),
        }
    }
}
