use crate::driver::Connection;
use crate::schema::PropertyId;
use crate::{Entity, Error, Result, Type, Value};
use std::fmt;
use tracing::debug;

/// How primary key values of an entity type are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyGeneratorKind {
    /// Values are assigned manually
    None,
    Sequence,
    Query,
    Increment,
    /// Values are assigned by the database on insert
    Automatic,
}

impl KeyGeneratorKind {
    pub fn is_manual(self) -> bool {
        matches!(self, KeyGeneratorKind::None)
    }

    pub fn is_auto_increment(self) -> bool {
        matches!(self, KeyGeneratorKind::Automatic)
    }
}

/// Populates primary key values around inserts, invoked by the persistence layer.
pub trait KeyGenerator: fmt::Debug {
    fn kind(&self) -> KeyGeneratorKind;

    /// Called before `entity` is inserted.
    fn before_insert(&self, _entity: &mut Entity, _connection: &mut dyn Connection) -> Result<()> {
        Ok(())
    }

    /// Called after `entity` has been inserted.
    fn after_insert(&self, _entity: &mut Entity, _connection: &mut dyn Connection) -> Result<()> {
        Ok(())
    }

    /// Whether the insert statement returns the generated primary key values.
    fn returns_primary_key_values(&self) -> bool {
        false
    }
}

/// Primary key values are assigned manually.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoKeyGenerator;

impl KeyGenerator for NoKeyGenerator {
    fn kind(&self) -> KeyGeneratorKind {
        KeyGeneratorKind::None
    }
}

/// Selects `max(column) + 1` before inserting an entity without a primary key value.
#[derive(Debug, Clone)]
pub struct IncrementKeyGenerator {
    query: String,
}

impl IncrementKeyGenerator {
    pub fn new(table_name: &str, column_name: &str) -> IncrementKeyGenerator {
        IncrementKeyGenerator {
            query: format!("select max({column_name}) + 1 from {table_name}"),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

impl KeyGenerator for IncrementKeyGenerator {
    fn kind(&self) -> KeyGeneratorKind {
        KeyGeneratorKind::Increment
    }

    fn before_insert(&self, entity: &mut Entity, connection: &mut dyn Connection) -> Result<()> {
        query_if_null(entity, connection, &self.query)
    }
}

/// Selects the next value of a sequence before inserting an entity without a primary
/// key value.
#[derive(Debug, Clone)]
pub struct SequenceKeyGenerator {
    sequence: String,
}

impl SequenceKeyGenerator {
    pub fn new(sequence: impl Into<String>) -> SequenceKeyGenerator {
        SequenceKeyGenerator {
            sequence: sequence.into(),
        }
    }
}

impl KeyGenerator for SequenceKeyGenerator {
    fn kind(&self) -> KeyGeneratorKind {
        KeyGeneratorKind::Sequence
    }

    fn before_insert(&self, entity: &mut Entity, connection: &mut dyn Connection) -> Result<()> {
        let query = connection.sequence_query(&self.sequence);
        query_if_null(entity, connection, &query)
    }
}

/// Runs a fixed query before inserting an entity without a primary key value.
#[derive(Debug, Clone)]
pub struct QueriedKeyGenerator {
    query: String,
}

impl QueriedKeyGenerator {
    pub fn new(query: impl Into<String>) -> QueriedKeyGenerator {
        QueriedKeyGenerator {
            query: query.into(),
        }
    }
}

impl KeyGenerator for QueriedKeyGenerator {
    fn kind(&self) -> KeyGeneratorKind {
        KeyGeneratorKind::Query
    }

    fn before_insert(&self, entity: &mut Entity, connection: &mut dyn Connection) -> Result<()> {
        query_if_null(entity, connection, &self.query)
    }
}

/// Reads the value generated by the database once the entity has been inserted.
#[derive(Debug, Clone)]
pub struct AutomaticKeyGenerator {
    source: String,
}

impl AutomaticKeyGenerator {
    /// `source` names the table or sequence generating the values.
    pub fn new(source: impl Into<String>) -> AutomaticKeyGenerator {
        AutomaticKeyGenerator {
            source: source.into(),
        }
    }
}

impl KeyGenerator for AutomaticKeyGenerator {
    fn kind(&self) -> KeyGeneratorKind {
        KeyGeneratorKind::Automatic
    }

    fn after_insert(&self, entity: &mut Entity, connection: &mut dyn Connection) -> Result<()> {
        let query = connection.auto_increment_query(&self.source);
        query_and_set(entity, connection, &query)
    }
}

fn query_if_null(entity: &mut Entity, connection: &mut dyn Connection, query: &str) -> Result<()> {
    let (id, _) = first_key_column(entity)?;
    if entity.is_null(&id)? {
        query_and_set(entity, connection, query)?;
    }
    Ok(())
}

fn query_and_set(entity: &mut Entity, connection: &mut dyn Connection, query: &str) -> Result<()> {
    let (id, ty) = first_key_column(entity)?;
    debug!(
        target: "rowmodel::key_generator",
        entity = %entity.entity_id(),
        property = %id,
        query,
        "querying primary key value"
    );

    let value = match ty {
        Type::I32 => Value::I32(connection.query_integer(query)?),
        Type::I64 => Value::I64(connection.query_long(query)?),
        other => {
            return Err(Error::key_generation(format!(
                "queried keys are only supported for I32 and I64 columns, `{id}` is {other}"
            )))
        }
    };

    entity.put(&id, value)?;
    Ok(())
}

fn first_key_column(entity: &Entity) -> Result<(PropertyId, Type)> {
    match entity.definition().primary_key_properties().next() {
        Some(property) => Ok((property.id().clone(), property.ty().clone())),
        None => Err(Error::invalid_definition(format!(
            "entity `{}` has no primary key",
            entity.entity_id()
        ))),
    }
}
