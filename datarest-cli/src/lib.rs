//! Command-line front end for datarest.
//!
//! Loads entity metadata and a JSON dataset from disk and serves
//! resource requests against them:
//! - [`DataRest::show`] renders an item in a negotiated shape, honouring
//!   conditional request headers
//! - [`DataRest::list`] renders a collection, optionally paged
//! - [`DataRest::update`] applies a JSON Patch, merge patch or PUT and
//!   stores the result in the in-memory [`Dataset`]

mod config;
mod dataset;
mod service;

pub use config::DatarestConfig;
pub use dataset::Dataset;
pub use service::{DataRest, HAL_MEDIA_TYPE, Preconditions, Response};
