use crate::{Result, Type, Value};
use std::fmt;

/// Translates between a property's domain value and its column representation.
pub trait ValueConverter: fmt::Debug {
    fn to_column_value(&self, value: &Value) -> Result<Value>;

    fn from_column_value(&self, column_value: Value) -> Result<Value>;

    /// The type stored in the column, when it differs from the property type.
    fn column_type(&self) -> Option<Type> {
        None
    }
}

/// Stores booleans in a column using two arbitrary values, such as `1`/`0` or
/// `"Y"`/`"N"`.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanConverter {
    true_value: Value,
    false_value: Value,
}

impl BooleanConverter {
    pub fn new(true_value: impl Into<Value>, false_value: impl Into<Value>) -> BooleanConverter {
        BooleanConverter {
            true_value: true_value.into(),
            false_value: false_value.into(),
        }
    }
}

impl ValueConverter for BooleanConverter {
    fn to_column_value(&self, value: &Value) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Bool(true) => Ok(self.true_value.clone()),
            Value::Bool(false) => Ok(self.false_value.clone()),
            other => crate::bail!("cannot convert {} to a boolean column value", other.type_name()),
        }
    }

    fn from_column_value(&self, column_value: Value) -> Result<Value> {
        if column_value.is_null() {
            Ok(Value::Null)
        } else if column_value == self.true_value {
            Ok(Value::Bool(true))
        } else if column_value == self.false_value {
            Ok(Value::Bool(false))
        } else {
            crate::bail!("unrecognized boolean column value `{column_value}`")
        }
    }

    fn column_type(&self) -> Option<Type> {
        self.true_value.infer_ty()
    }
}
