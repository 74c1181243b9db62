use super::EntitySerializer;
use crate::Registry;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use rowmodel_core::schema::PropertyKind;
use rowmodel_core::{Entity, Error, Result, Value};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Encodes entities with bincode.
///
/// An entity is written as its domain id, entity id and modified flag, followed by every
/// non-derived property in declaration order. Each property carries its value, if any,
/// and for a modified entity also the original value of a modified property.
/// Referenced entities are written recursively.
#[derive(Debug, Default, Clone, Copy)]
pub struct BinarySerializer;

impl BinarySerializer {
    /// The name selecting this serializer in the domain settings.
    pub const NAME: &'static str = "binary";
}

#[derive(Debug, Serialize, Deserialize)]
struct EntityRecord {
    domain_id: String,
    entity_id: String,
    modified: bool,
    properties: Vec<PropertyRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PropertyRecord {
    /// `None` when the entity holds no value
    value: Option<ValueRecord>,

    /// `None` unless the entity is modified, then `Some(None)` for an unmodified
    /// property
    original: Option<Option<ValueRecord>>,
}

#[derive(Debug, Serialize, Deserialize)]
enum ValueRecord {
    Null,
    Bool(bool),
    Char(char),
    I32(i32),
    I64(i64),
    F64(f64),
    /// Decimal text, which keeps the scale
    Decimal(String),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Blob(Vec<u8>),
    Entity(Box<EntityRecord>),
}

impl EntitySerializer for BinarySerializer {
    fn serialize(&self, entity: &Entity) -> Result<Vec<u8>> {
        let bytes = bincode::serialize(&EntityRecord::from_entity(entity))
            .map_err(|err| Error::serialization_failure(err.to_string()))?;

        debug!(
            target: "rowmodel::serializer",
            entity = %entity.entity_id(),
            len = bytes.len(),
            "entity serialized"
        );
        Ok(bytes)
    }

    fn deserialize(&self, registry: &Registry, bytes: &[u8]) -> Result<Entity> {
        let record: EntityRecord = bincode::deserialize(bytes)
            .map_err(|err| Error::serialization_failure(err.to_string()))?;
        record.into_entity(registry)
    }
}

impl EntityRecord {
    fn from_entity(entity: &Entity) -> EntityRecord {
        let modified = is_modified(entity);

        let properties = entity
            .definition()
            .properties()
            .filter(|property| !property.is_derived())
            .map(|property| {
                let id = property.id().as_str();
                PropertyRecord {
                    value: entity.values().get(id).map(ValueRecord::from_value),
                    original: modified.then(|| {
                        entity
                            .is_modified_property(id)
                            .then(|| ValueRecord::from_value(&entity.original(id)))
                    }),
                }
            })
            .collect();

        EntityRecord {
            domain_id: entity.domain().id().to_string(),
            entity_id: entity.entity_id().to_string(),
            modified,
            properties,
        }
    }

    fn into_entity(self, registry: &Registry) -> Result<Entity> {
        let domain = registry.get(&self.domain_id)?;
        let definition = domain.definition(&self.entity_id)?;
        let properties: Vec<_> = definition
            .properties()
            .filter(|property| !property.is_derived())
            .collect();

        if properties.len() != self.properties.len() {
            return Err(Error::serialization_failure(format!(
                "entity `{}` has {} serializable properties, but {} were written",
                self.entity_id,
                properties.len(),
                self.properties.len()
            )));
        }

        let mut values = IndexMap::new();
        let mut originals = IndexMap::new();
        for (property, record) in properties.into_iter().zip(self.properties) {
            if let Some(value) = record.value {
                values.insert(property.id().clone(), value.into_value(registry)?);
            }
            if let Some(Some(original)) = record.original {
                originals.insert(property.id().clone(), original.into_value(registry)?);
            }
        }

        domain.entity_from_values(&self.entity_id, values, originals)
    }
}

impl ValueRecord {
    fn from_value(value: &Value) -> ValueRecord {
        match value {
            Value::Null => ValueRecord::Null,
            Value::Bool(v) => ValueRecord::Bool(*v),
            Value::Char(v) => ValueRecord::Char(*v),
            Value::I32(v) => ValueRecord::I32(*v),
            Value::I64(v) => ValueRecord::I64(*v),
            Value::F64(v) => ValueRecord::F64(*v),
            Value::Decimal(v) => ValueRecord::Decimal(v.to_string()),
            Value::String(v) => ValueRecord::String(v.clone()),
            Value::Date(v) => ValueRecord::Date(*v),
            Value::Time(v) => ValueRecord::Time(*v),
            Value::Timestamp(v) => ValueRecord::Timestamp(*v),
            Value::Blob(v) => ValueRecord::Blob(v.clone()),
            Value::Entity(entity) => ValueRecord::Entity(Box::new(EntityRecord::from_entity(entity))),
        }
    }

    fn into_value(self, registry: &Registry) -> Result<Value> {
        Ok(match self {
            ValueRecord::Null => Value::Null,
            ValueRecord::Bool(v) => Value::Bool(v),
            ValueRecord::Char(v) => Value::Char(v),
            ValueRecord::I32(v) => Value::I32(v),
            ValueRecord::I64(v) => Value::I64(v),
            ValueRecord::F64(v) => Value::F64(v),
            ValueRecord::Decimal(v) => Value::Decimal(v.parse::<Decimal>().map_err(|err| {
                Error::serialization_failure(format!("invalid decimal `{v}`: {err}"))
            })?),
            ValueRecord::String(v) => Value::String(v),
            ValueRecord::Date(v) => Value::Date(v),
            ValueRecord::Time(v) => Value::Time(v),
            ValueRecord::Timestamp(v) => Value::Timestamp(v),
            ValueRecord::Blob(v) => Value::Blob(v),
            ValueRecord::Entity(record) => Value::from(record.into_entity(registry)?),
        })
    }
}

/// Like [`Entity::is_modified`], except that every modified transient property counts.
fn is_modified(entity: &Entity) -> bool {
    let definition = entity.definition();
    entity.values().original_keys().any(|id| {
        let Some(property) = definition.find_property(id) else {
            return false;
        };
        match property.kind() {
            PropertyKind::Transient(_) => true,
            _ => property
                .as_column()
                .map(|column| !property.is_read_only() && column.is_updatable())
                .unwrap_or(false),
        }
    })
}
