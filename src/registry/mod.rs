//! Catalog registries
//!
//! - [`AttributeRegistry`]: typed attribute definitions
//! - [`TypeRegistry`]: channel types
//!
//! Both are thin repositories over an injected [`RowStore`](crate::store::RowStore);
//! uniqueness and referential checks are enforced inside store batches.

mod attributes;
mod channel_types;

pub use attributes::{sort_attributes, AttributePatch, AttributeRegistry, NewAttribute};
pub use channel_types::{ChannelTypePatch, NewChannelType, TypeRegistry};

use serde_json::Value;

use crate::store::Row;

/// One past the largest `display_order` among `rows`, starting at 1.
///
/// Saturates at `i32::MAX`; ties at the end are broken by code.
pub(crate) fn next_display_order(rows: &[Row]) -> i32 {
    rows.iter()
        .filter_map(|row| row.get("display_order").and_then(Value::as_i64))
        .max()
        .map_or(1, |max| {
            i32::try_from(max)
                .unwrap_or(if max < 0 { 0 } else { i32::MAX })
                .saturating_add(1)
        })
}
