//! channel_registry - per-type attribute schemas for channel records
//!
//! Channel types declare which attributes their records carry. Records are
//! validated against the resolved schema of their type on every write, and
//! reads fall back to the fixed-column legacy table while it still exists.

pub mod catalog;
pub mod cli;
pub mod errors;
pub mod http_server;
pub mod model;
pub mod observability;
pub mod records;
pub mod registry;
pub mod schema;
pub mod seed;
pub mod store;

pub use catalog::Catalog;
pub use errors::{CatalogError, CatalogResult, ErrorKind, IssueKind, ValidationIssue};
