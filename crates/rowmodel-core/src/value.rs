mod hash_code;
mod num;
mod ty;
pub use ty::Type;
mod value_chrono;

use crate::Entity;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::fmt;

/// A dynamically typed property value.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Value {
    /// Null value
    #[default]
    Null,

    /// Boolean value
    Bool(bool),

    /// A single character
    Char(char),

    /// Signed 32-bit integer
    I32(i32),

    /// Signed 64-bit integer
    I64(i64),

    /// Double precision floating point number
    F64(f64),

    /// Arbitrary precision decimal number
    Decimal(Decimal),

    /// String value
    String(String),

    /// Calendar date
    Date(NaiveDate),

    /// Time of day
    Time(NaiveTime),

    /// Date and time of day
    Timestamp(NaiveDateTime),

    /// Binary data
    Blob(Vec<u8>),

    /// A referenced entity, the value of a foreign key property
    Entity(Box<Entity>),
}

impl Value {
    /// Returns a `Value` representing null
    pub const fn null() -> Self {
        Self::Null
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Name of the value's variant, used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            Self::Null => "Null".to_string(),
            Self::Bool(_) => "Bool".to_string(),
            Self::Char(_) => "Char".to_string(),
            Self::I32(_) => "I32".to_string(),
            Self::I64(_) => "I64".to_string(),
            Self::F64(_) => "F64".to_string(),
            Self::Decimal(_) => "Decimal".to_string(),
            Self::String(_) => "String".to_string(),
            Self::Date(_) => "Date".to_string(),
            Self::Time(_) => "Time".to_string(),
            Self::Timestamp(_) => "Timestamp".to_string(),
            Self::Blob(_) => "Blob".to_string(),
            Self::Entity(entity) => format!("Entity({})", entity.entity_id()),
        }
    }

    /// Infers the type of the value. Null has no type.
    pub fn infer_ty(&self) -> Option<Type> {
        Some(match self {
            Self::Null => return None,
            Self::Bool(_) => Type::Bool,
            Self::Char(_) => Type::Char,
            Self::I32(_) => Type::I32,
            Self::I64(_) => Type::I64,
            Self::F64(_) => Type::F64,
            Self::Decimal(_) => Type::Decimal,
            Self::String(_) => Type::String,
            Self::Date(_) => Type::Date,
            Self::Time(_) => Type::Time,
            Self::Timestamp(_) => Type::Timestamp,
            Self::Blob(_) => Type::Blob,
            Self::Entity(entity) => Type::Entity(entity.entity_id().clone()),
        })
    }

    /// Returns `true` if the value can be stored in a property of type `ty`. Null is
    /// accepted for every type.
    pub fn is_a(&self, ty: &Type) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(_) => ty.is_bool(),
            Self::Char(_) => ty.is_char(),
            Self::I32(_) => ty.is_i32(),
            Self::I64(_) => ty.is_i64(),
            Self::F64(_) => ty.is_f64(),
            Self::Decimal(_) => ty.is_decimal(),
            Self::String(_) => ty.is_string(),
            Self::Date(_) => ty.is_date(),
            Self::Time(_) => ty.is_time(),
            Self::Timestamp(_) => ty.is_timestamp(),
            Self::Blob(_) => ty.is_blob(),
            Self::Entity(entity) => match ty {
                Type::Entity(entity_id) => entity.entity_id() == entity_id,
                _ => false,
            },
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::I32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<&Decimal> {
        match self {
            Self::Decimal(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            Self::Time(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Self::Blob(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Self::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    #[track_caller]
    pub fn expect_entity(&self) -> &Entity {
        match self {
            Self::Entity(entity) => entity,
            _ => panic!("expected entity, but was {self:?}"),
        }
    }

    /// Returns the value as a double if it is numerical.
    pub fn to_f64(&self) -> Option<f64> {
        use rust_decimal::prelude::ToPrimitive;

        match self {
            Self::I32(v) => Some(f64::from(*v)),
            Self::I64(v) => Some(*v as f64),
            Self::F64(v) => Some(*v),
            Self::Decimal(v) => v.to_f64(),
            _ => None,
        }
    }

    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => fmt::Display::fmt(v, f),
            Self::Char(v) => fmt::Display::fmt(v, f),
            Self::I32(v) => fmt::Display::fmt(v, f),
            Self::I64(v) => fmt::Display::fmt(v, f),
            Self::F64(v) => fmt::Display::fmt(v, f),
            Self::Decimal(v) => fmt::Display::fmt(v, f),
            Self::String(v) => f.write_str(v),
            Self::Date(v) => fmt::Display::fmt(v, f),
            Self::Time(v) => fmt::Display::fmt(v, f),
            Self::Timestamp(v) => fmt::Display::fmt(v, f),
            Self::Blob(v) => write!(f, "<{} bytes>", v.len()),
            Self::Entity(entity) => fmt::Display::fmt(entity, f),
        }
    }
}

impl AsRef<Self> for Value {
    fn as_ref(&self) -> &Self {
        self
    }
}

impl From<bool> for Value {
    fn from(src: bool) -> Self {
        Self::Bool(src)
    }
}

impl From<char> for Value {
    fn from(src: char) -> Self {
        Self::Char(src)
    }
}

impl From<String> for Value {
    fn from(src: String) -> Self {
        Self::String(src)
    }
}

impl From<&String> for Value {
    fn from(src: &String) -> Self {
        Self::String(src.clone())
    }
}

impl From<&str> for Value {
    fn from(src: &str) -> Self {
        Self::String(src.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(src: Vec<u8>) -> Self {
        Self::Blob(src)
    }
}

impl From<Entity> for Value {
    fn from(src: Entity) -> Self {
        Self::Entity(Box::new(src))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(src: Option<T>) -> Self {
        match src {
            Some(value) => value.into(),
            None => Self::Null,
        }
    }
}
