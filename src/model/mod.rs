//! Data model for the channel registry
//!
//! - `Attribute`: reusable, typed field definition
//! - `ChannelType`: a category of channel
//! - `TypeAttributeBinding`: makes an attribute apply to a type
//! - `ChannelRecord`: a channel and its attribute values

mod code;
mod types;
mod value;

pub use code::{validate_attribute_code, validate_code, MAX_CODE_LEN, RESERVED_FIELDS};
pub use types::{Attribute, ChannelRecord, ChannelType, DataType, RecordSource, TypeAttributeBinding};
pub use value::{is_blank, AttributeValue};
