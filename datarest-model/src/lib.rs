//! Entity model for datarest.
//!
//! Defines the runtime-described data model that the assembly and patch
//! layers operate on:
//! - [`PersistentEntity`] / [`PersistentProperty`]: metadata descriptors for a
//!   type and its properties (cardinality, association target, export and
//!   protection flags)
//! - [`Value`] / [`Instance`]: dynamic instance data, including references to
//!   other entities
//! - [`MetadataProvider`]: the lookup contract, with [`EntityRegistry`] as an
//!   in-memory implementation
//! - [`ExcerptProjector`], [`AuditingAccessor`], [`AssociationResolver`]:
//!   collaborators supplied by the embedding application
//! - [`RequestContext`] / [`SelfLinkProvider`]: explicit base-URI handling for
//!   self links
//!
//! Nothing in this crate performs I/O or holds mutable shared state.

mod context;
mod error;
mod handler;
mod instance;
mod registry;
mod schema;
mod value;

pub use context::{RequestContext, SelfLinkProvider};
pub use error::{ModelError, ModelResult};
pub use handler::{
    AssociationResolver, AuditingAccessor, ExcerptProjector, NoExcerpts, NoResolver,
    PropertyAuditing, PropertyExcerpts,
};
pub use instance::Instance;
pub use registry::{EntityRegistry, MetadataProvider};
pub use schema::{Cardinality, PersistentEntity, PersistentProperty, ValueType};
pub use value::{ConversionError, Value};
