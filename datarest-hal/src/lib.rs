//! Resource assembly for datarest.
//!
//! Turns entity instances into hypermedia [`Resource`]s driven purely by
//! entity metadata:
//! - [`AssociationLinkCollector`] derives association links, or embedded
//!   excerpts when a projection is registered for the target type
//! - [`ResourceAssembler`] composes content, self link, association links and
//!   embedded excerpts into summary, full, compact and schema shapes
//! - [`ConditionalRequestEvaluator`] computes `ETag` / `Last-Modified` and the
//!   modified / not-modified verdict for conditional requests
//!
//! Embedding is always exactly one level deep: an embedded resource carries
//! its own self link and association links but never embeds further. This is
//! what keeps bidirectional associations from expanding without bound.

mod assembler;
mod collector;
mod conditional;
mod error;
mod resource;
mod schema;
mod shape;

pub use assembler::{AssemblerConfig, Pagination, ResourceAssembler};
pub use collector::{AssociationLinkCollector, CollectedAssociations, EmbedMode};
pub use conditional::{ConditionalOutcome, ConditionalRequestEvaluator, ResponseHeaders};
pub use error::{HalError, HalResult};
pub use resource::{CollectionContent, CollectionResource, Embedded, EmbeddedResources, Resource};
pub use shape::{Representation, RepresentationShape};
