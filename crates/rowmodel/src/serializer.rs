//! Pluggable entity serialization, used to move entities between processes.

mod binary;
pub use binary::BinarySerializer;

use crate::Registry;
use rowmodel_core::schema::Settings;
use rowmodel_core::{Entity, Error, Result};

/// Converts entities to and from bytes.
pub trait EntitySerializer {
    fn serialize(&self, entity: &Entity) -> Result<Vec<u8>>;

    /// Decodes an entity, resolving its domain through `registry`.
    fn deserialize(&self, registry: &Registry, bytes: &[u8]) -> Result<Entity>;
}

/// Returns the serializer named by `settings.entity_serializer`, or `None` when no
/// serializer is configured.
pub fn serializer_for(settings: &Settings) -> Result<Option<Box<dyn EntitySerializer>>> {
    match settings.entity_serializer.as_deref() {
        None => Ok(None),
        Some(BinarySerializer::NAME) => Ok(Some(Box::new(BinarySerializer))),
        Some(other) => Err(Error::serialization_failure(format!(
            "unknown entity serializer `{other}`"
        ))),
    }
}
