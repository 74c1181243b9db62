use crate::Value;
use indexmap::IndexMap;
use std::borrow::Cow;

/// The values a derived property is computed from, keyed by source property id.
#[derive(Debug)]
pub enum SourceValues<'a> {
    Single(&'a str, Cow<'a, Value>),
    Many(IndexMap<&'a str, Cow<'a, Value>>),
}

impl SourceValues<'_> {
    /// The value of source `id`, `None` if `id` is not a source.
    pub fn get(&self, id: &str) -> Option<&Value> {
        match self {
            SourceValues::Single(source, value) if *source == id => Some(&**value),
            SourceValues::Single(..) => None,
            SourceValues::Many(values) => values.get(id).map(|value| &**value),
        }
    }

    pub fn get_i32(&self, id: &str) -> Option<i32> {
        self.get(id).and_then(Value::as_i32)
    }

    pub fn get_i64(&self, id: &str) -> Option<i64> {
        self.get(id).and_then(Value::as_i64)
    }

    /// The value of a numerical source as a double.
    pub fn get_f64(&self, id: &str) -> Option<f64> {
        self.get(id).and_then(Value::to_f64)
    }

    pub fn get_str(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        match self {
            SourceValues::Single(..) => 1,
            SourceValues::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
