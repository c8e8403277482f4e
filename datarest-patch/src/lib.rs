//! Partial updates for datarest.
//!
//! Three strategies share one binder:
//! - [`JsonPatch`]: RFC 6902 operations replayed against the materialized
//!   instance
//! - [`merge_patch`]: recursive merge of a partial tree, with a configurable
//!   [`ArrayMergePolicy`]
//! - [`put`]: binding of a full representation, re-grafting server-owned
//!   properties from the existing instance
//!
//! Every strategy works on request-local trees and a detached copy of the
//! instance; the caller's instance is never modified and nothing is
//! persisted here.

mod binder;
mod engine;
mod error;
mod json_patch;
mod merge;
mod pointer;
mod put;
mod tree;

pub use binder::Binder;
pub use engine::{
    JSON_PATCH_MEDIA_TYPE, MERGE_PATCH_MEDIA_TYPE, PatchConfig, PatchEngine, PatchStrategy,
};
pub use error::{PatchError, PatchResult};
pub use json_patch::{JsonPatch, PatchOperation};
pub use merge::{ArrayMergePolicy, merge_patch};
pub use pointer::JsonPointer;
pub use put::put;
pub use tree::TreeMaterializer;
