//! Wiring of the registries, schema components and record store over one
//! row store.

use std::sync::Arc;

use crate::records::{ChannelStore, CurrentChannels, LegacyChannels, LegacyConfig};
use crate::registry::{AttributeRegistry, TypeRegistry};
use crate::schema::{RecordValidator, SchemaBinder, SchemaResolver};
use crate::store::{MemoryRowStore, RowStore};

/// All catalog components sharing a single [`RowStore`]
#[derive(Clone)]
pub struct Catalog {
    pub attributes: AttributeRegistry,
    pub types: TypeRegistry,
    pub binder: Arc<SchemaBinder>,
    pub resolver: SchemaResolver,
    pub validator: RecordValidator,
    pub channels: ChannelStore,
}

impl Catalog {
    pub fn new(store: Arc<dyn RowStore>, legacy: LegacyConfig) -> Self {
        let attributes = AttributeRegistry::new(store.clone());
        let types = TypeRegistry::new(store.clone());
        let binder = Arc::new(SchemaBinder::new(store.clone()));
        let resolver = SchemaResolver::new(binder.clone());
        let validator = RecordValidator::new(resolver.clone());
        let channels = ChannelStore::new(
            Arc::new(CurrentChannels::new(store.clone())),
            Arc::new(LegacyChannels::new(store, legacy)),
            types.clone(),
            validator.clone(),
        );

        Self {
            attributes,
            types,
            binder,
            resolver,
            validator,
            channels,
        }
    }

    /// Catalog over a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryRowStore::new()), LegacyConfig::default())
    }
}
