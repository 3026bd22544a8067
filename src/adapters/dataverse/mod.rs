//! Dataverse Web API adapter
//!
//! - [`AccountSource`] - the seam the sweep engine depends on
//! - [`DataverseClient`] - production implementation over the `accounts` entity set
//! - [`classify`] - transient/permanent classification of HTTP failures
//! - [`batch_request`] - `$batch` changeset construction and response checks

pub mod batch_request;
pub mod classify;
pub mod client;
pub mod models;
pub mod source;

pub use client::DataverseClient;
pub use source::{AccountSource, IdPage};
