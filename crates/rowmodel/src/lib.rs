mod registry;
pub use registry::Registry;

pub mod serializer;
pub use serializer::{serializer_for, BinarySerializer, EntitySerializer};

pub use rowmodel_core::{
    bail, driver, err, schema, validator, value, Connection, DefaultValidator, Domain, Entity,
    Error, IntoError, Key, KeyShape, Result, SourceValues, Type, Validator, Value, ValueChange,
    ValueMap,
};
