//! Core value types for datarest.
//!
//! This crate defines the small, metadata-agnostic types shared by the
//! assembly and patch layers:
//! - [`Link`] / [`Links`] and the well-known relation names
//! - [`ETag`] entity tags derived from version properties
//! - [`HttpDate`] whole-second timestamps used for `Last-Modified`
//! - [`PageMetadata`] supplied by an external pager
//!
//! Nothing here knows about entity metadata; that lives in `datarest-model`.

mod etag;
mod link;
mod page;
mod timestamp;

pub use etag::ETag;
pub use link::{Link, Links, NEXT_REL, PREV_REL, SELF_REL};
pub use page::PageMetadata;
pub use timestamp::{HttpDate, InvalidHttpDate};
