//! Observable events for the channel registry
//!
//! Events are explicit and typed. Every log line emitted by the catalog
//! carries one of these names in its `event` field.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & Lifecycle
    BootStart,
    BootComplete,
    ConfigLoaded,
    StoreOpened,
    CatalogSeeded,
    ServerListening,

    // Attribute registry
    AttributeCreated,
    AttributeUpdated,
    AttributeDeleted,

    // Type registry
    ChannelTypeCreated,
    ChannelTypeUpdated,
    ChannelTypeDeleted,

    // Schema binder
    BindingAttached,
    BindingDetached,
    BindingRequiredChanged,
    BindingsReordered,

    // Records
    RecordCreated,
    RecordUpdated,
    RecordDeleted,
    RecordRejected,
    /// A read was served from the fixed-column table
    LegacyFallback,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "BOOT_START",
            Event::BootComplete => "BOOT_COMPLETE",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreOpened => "STORE_OPENED",
            Event::CatalogSeeded => "CATALOG_SEEDED",
            Event::ServerListening => "SERVER_LISTENING",
            Event::AttributeCreated => "ATTRIBUTE_CREATED",
            Event::AttributeUpdated => "ATTRIBUTE_UPDATED",
            Event::AttributeDeleted => "ATTRIBUTE_DELETED",
            Event::ChannelTypeCreated => "CHANNEL_TYPE_CREATED",
            Event::ChannelTypeUpdated => "CHANNEL_TYPE_UPDATED",
            Event::ChannelTypeDeleted => "CHANNEL_TYPE_DELETED",
            Event::BindingAttached => "BINDING_ATTACHED",
            Event::BindingDetached => "BINDING_DETACHED",
            Event::BindingRequiredChanged => "BINDING_REQUIRED_CHANGED",
            Event::BindingsReordered => "BINDINGS_REORDERED",
            Event::RecordCreated => "RECORD_CREATED",
            Event::RecordUpdated => "RECORD_UPDATED",
            Event::RecordDeleted => "RECORD_DELETED",
            Event::RecordRejected => "RECORD_REJECTED",
            Event::LegacyFallback => "LEGACY_FALLBACK",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
