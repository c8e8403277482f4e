//! Conditional request evaluation (`ETag` / `Last-Modified`).

use crate::error::{HalError, HalResult};
use datarest_model::{AuditingAccessor, Instance, PersistentEntity};
use datarest_types::{ETag, HttpDate};
use std::sync::Arc;
use tracing::debug;

/// Validators computed for an instance.
///
/// Contains whichever of `ETag` / `Last-Modified` could be computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeaders {
    pub etag: ETag,
    pub last_modified: Option<HttpDate>,
}

impl ResponseHeaders {
    /// Header name / value pairs, `ETag` first.
    pub fn to_header_pairs(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::with_capacity(2);
        if let Some(etag) = self.etag.to_header_value() {
            headers.push(("ETag", etag));
        }
        if let Some(last_modified) = &self.last_modified {
            headers.push(("Last-Modified", last_modified.to_string()));
        }
        headers
    }

    pub fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }
}

/// Verdict of [`ConditionalRequestEvaluator::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalOutcome {
    /// `false` means the client's copy is current (304).
    pub modified: bool,
    /// Sent regardless of the verdict.
    pub headers: ResponseHeaders,
}

/// Computes validators and evaluates `If-None-Match`, `If-Modified-Since`
/// and `If-Match` against them.
#[derive(Clone)]
pub struct ConditionalRequestEvaluator {
    auditing: Arc<dyn AuditingAccessor>,
}

impl ConditionalRequestEvaluator {
    pub fn new(auditing: Arc<dyn AuditingAccessor>) -> Self {
        Self { auditing }
    }

    /// The quoted version when the entity declares one and it is set,
    /// otherwise [`ETag::NONE`].
    pub fn etag_for(&self, instance: &Instance, entity: &PersistentEntity) -> ETag {
        let version = entity
            .version_property
            .as_deref()
            .map(|name| instance.value(name))
            .filter(|value| !value.is_null())
            .and_then(|value| value.to_key_string());
        ETag::from_optional(version)
    }

    /// Last-modified timestamp, truncated to whole seconds.
    pub fn last_modified_for(&self, instance: &Instance) -> Option<HttpDate> {
        self.auditing.last_modified(instance).map(HttpDate::from_datetime)
    }

    pub fn prepare_headers(&self, instance: &Instance, entity: &PersistentEntity) -> ResponseHeaders {
        ResponseHeaders {
            etag: self.etag_for(instance, entity),
            last_modified: self.last_modified_for(instance),
        }
    }

    /// Not modified if either the `If-None-Match` header matches the current
    /// tag or the last-modified time is not after `If-Modified-Since`.
    pub fn evaluate(
        &self,
        if_none_match: Option<&str>,
        if_modified_since: Option<HttpDate>,
        instance: &Instance,
        entity: &PersistentEntity,
    ) -> ConditionalOutcome {
        let headers = self.prepare_headers(instance, entity);

        let etag_matches = if_none_match.is_some_and(|header| headers.etag.matches_header(header));
        let unchanged_since = match (&headers.last_modified, &if_modified_since) {
            (Some(last_modified), Some(since)) => !last_modified.is_after(since),
            _ => false,
        };

        let modified = !(etag_matches || unchanged_since);
        debug!(
            "Evaluated conditional request for {}: modified={} (etag match: {}, unchanged since: {})",
            entity.name, modified, etag_matches, unchanged_since
        );

        ConditionalOutcome { modified, headers }
    }

    /// Checks an `If-Match` precondition before a write.
    ///
    /// Passes when no header is supplied or the entity has no tag.
    pub fn verify_if_match(
        &self,
        if_match: Option<&str>,
        instance: &Instance,
        entity: &PersistentEntity,
    ) -> HalResult<()> {
        let Some(header) = if_match else {
            return Ok(());
        };

        let current = self.etag_for(instance, entity);
        if current.is_none() || current.matches_header(header) {
            return Ok(());
        }

        Err(HalError::PreconditionFailed {
            expected: header.trim().to_string(),
            current: current.to_string(),
        })
    }
}
