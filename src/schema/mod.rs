//! Per-type schemas
//!
//! - [`SchemaBinder`]: attach, detach, require and reorder attributes
//! - [`SchemaResolver`]: the single source of a type's effective schema
//! - [`RecordValidator`]: checks records against the resolved schema
//!
//! The resolver reads through the [`SchemaSource`] port; in production that
//! is the binder, whose loads come from one consistent store snapshot.

mod binder;
mod resolver;
mod validator;

pub use binder::SchemaBinder;
pub use resolver::{FieldView, ResolvedField, ResolvedSchema, SchemaResolver, SchemaSource, TypeSchema};
pub use validator::{check, RecordValidator, ValidatedRecord, ValidationMode};
