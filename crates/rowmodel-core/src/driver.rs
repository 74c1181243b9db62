//! Narrow interfaces to the persistence layer.
//!
//! The core never runs SQL itself. Key generators run queries through a
//! [`Connection`], and column values are read from a [`ResultRow`].

use crate::schema::Property;
use crate::{Result, Type, Value};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

/// A database connection able to run scalar queries.
pub trait Connection {
    fn query_integer(&mut self, sql: &str) -> Result<i32>;

    fn query_long(&mut self, sql: &str) -> Result<i64>;

    /// Returns the query selecting the next value of `sequence`.
    fn sequence_query(&self, sequence: &str) -> String;

    /// Returns the query selecting the last value generated by `source`.
    fn auto_increment_query(&self, source: &str) -> String;
}

/// The current row of a tabular query result. Column indices are 1-based.
///
/// Primitive accessors return a zero-equivalent for SQL NULL, which is detected
/// through [`ResultRow::was_null`] right after the read.
pub trait ResultRow {
    fn get_bool(&mut self, index: usize) -> Result<bool>;

    fn get_i32(&mut self, index: usize) -> Result<i32>;

    fn get_i64(&mut self, index: usize) -> Result<i64>;

    fn get_f64(&mut self, index: usize) -> Result<f64>;

    fn get_decimal(&mut self, index: usize) -> Result<Option<Decimal>>;

    fn get_string(&mut self, index: usize) -> Result<Option<String>>;

    fn get_date(&mut self, index: usize) -> Result<Option<NaiveDate>>;

    fn get_time(&mut self, index: usize) -> Result<Option<NaiveTime>>;

    fn get_timestamp(&mut self, index: usize) -> Result<Option<NaiveDateTime>>;

    /// Returns `true` if the last column read was SQL NULL.
    fn was_null(&self) -> bool;
}

/// Reads the column at `index` as a value of type `ty`.
///
/// Blobs are never fetched eagerly and always read as null.
pub fn fetch_value(row: &mut dyn ResultRow, index: usize, ty: &Type) -> Result<Value> {
    let value = match ty {
        Type::Bool => primitive(row, |row| row.get_bool(index).map(Value::Bool))?,
        Type::I32 => primitive(row, |row| row.get_i32(index).map(Value::I32))?,
        Type::I64 => primitive(row, |row| row.get_i64(index).map(Value::I64))?,
        Type::F64 => primitive(row, |row| row.get_f64(index).map(Value::F64))?,
        Type::Decimal => row.get_decimal(index)?.into(),
        Type::String => row.get_string(index)?.into(),
        Type::Char => row
            .get_string(index)?
            .and_then(|string| string.chars().next())
            .into(),
        Type::Date => row.get_date(index)?.into(),
        Type::Time => row.get_time(index)?.into(),
        Type::Timestamp => row.get_timestamp(index)?.into(),
        Type::Blob => Value::Null,
        Type::Entity(entity_id) => {
            crate::bail!("entity `{entity_id}` can not be fetched from a single column")
        }
    };

    Ok(value)
}

fn primitive(
    row: &mut dyn ResultRow,
    read: impl FnOnce(&mut dyn ResultRow) -> Result<Value>,
) -> Result<Value> {
    let value = read(row)?;
    Ok(if row.was_null() { Value::Null } else { value })
}

impl Property {
    /// Reads this column's value from `row` at its select index and converts it to
    /// the domain representation.
    pub fn fetch(&self, row: &mut dyn ResultRow) -> Result<Value> {
        let Some(column) = self.as_column() else {
            crate::bail!("property `{}` is not a column", self.id());
        };
        if column.select_index() == 0 {
            crate::bail!("column `{}` is not selected", column.column_name());
        }

        match column.converter() {
            Some(converter) => {
                let ty = converter.column_type().unwrap_or_else(|| self.ty().clone());
                converter.from_column_value(fetch_value(row, column.select_index(), &ty)?)
            }
            None => fetch_value(row, column.select_index(), self.ty()),
        }
    }
}
