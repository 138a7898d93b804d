//! # HTTP Server Module
//!
//! JSON API over the catalog.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/api/attributes/*` - Attribute registry
//! - `/api/channel-types/*` - Types, bindings, resolved schemas, dry-run validation
//! - `/api/channels/*` - Channel records

pub mod catalog_routes;
pub mod channel_routes;
pub mod config;
pub mod errors;
pub mod server;
pub mod views;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult, ErrorResponse};
pub use server::{ApiState, HttpServer};
