//! Observability for the channel registry
//!
//! - Structured logging through `tracing`
//! - Typed event names ([`Event`])
//!
//! Log lines look like:
//!
//! ```text
//! INFO channel_registry::schema::binder: attribute attached event=BINDING_ATTACHED channel_type_id=8 attribute_id=6
//! ```
//!
//! Observability is read-only: nothing here affects the outcome of a request.

mod events;

pub use events::Event;

use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins over the configured filter when set. Calling this more
/// than once is harmless; later calls are ignored.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
