use crate::schema::EntityId;
use std::fmt;

/// The declared type of a property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Boolean value
    Bool,

    /// A single character
    Char,

    /// Signed 32-bit integer, SQL `INTEGER`
    I32,

    /// Signed 64-bit integer, SQL `BIGINT`
    I64,

    /// Double precision number, SQL `DOUBLE`
    F64,

    /// Decimal number, SQL `DECIMAL`
    Decimal,

    /// String type, SQL `VARCHAR`
    String,

    /// Calendar date
    Date,

    /// Time of day
    Time,

    /// Date and time of day
    Timestamp,

    /// Binary data, SQL `BLOB`
    Blob,

    /// An instance of the given entity type
    Entity(EntityId),
}

impl Type {
    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    pub fn is_char(&self) -> bool {
        matches!(self, Self::Char)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::String)
    }

    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date)
    }

    pub fn is_time(&self) -> bool {
        matches!(self, Self::Time)
    }

    pub fn is_timestamp(&self) -> bool {
        matches!(self, Self::Timestamp)
    }

    pub fn is_blob(&self) -> bool {
        matches!(self, Self::Blob)
    }

    /// Integer, double and decimal types are numerical.
    pub fn is_numerical(&self) -> bool {
        matches!(self, Self::I32 | Self::I64 | Self::F64 | Self::Decimal)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Time | Self::Timestamp)
    }

    pub fn is_entity(&self) -> bool {
        matches!(self, Self::Entity(_))
    }

    pub fn as_entity(&self) -> Option<&EntityId> {
        match self {
            Self::Entity(entity_id) => Some(entity_id),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity(entity_id) => write!(f, "Entity({entity_id})"),
            other => fmt::Debug::fmt(other, f),
        }
    }
}
