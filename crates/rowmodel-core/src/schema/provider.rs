use super::{EntityDefinition, Property, PropertyId};
use crate::{Entity, Error, Result, Value};
use std::cmp::Ordering;
use std::rc::Rc;

/// Renders the display string of an entity.
pub trait DisplayProvider {
    fn display(&self, entity: &Entity) -> String;
}

impl<F> DisplayProvider for F
where
    F: Fn(&Entity) -> String,
{
    fn display(&self, entity: &Entity) -> String {
        self(entity)
    }
}

/// Supplies the background color used when presenting a property value.
pub trait ColorProvider {
    fn background_color(&self, entity: &Entity, property: &Property) -> Option<String>;
}

impl<F> ColorProvider for F
where
    F: Fn(&Entity, &Property) -> Option<String>,
{
    fn background_color(&self, entity: &Entity, property: &Property) -> Option<String> {
        self(entity, property)
    }
}

/// Orders entities of one type.
pub type Comparator = Rc<dyn Fn(&Entity, &Entity) -> Ordering>;

/// Produces a query condition string from a list of values.
pub type ConditionProvider = Rc<dyn Fn(&[Value]) -> String>;

/// Builds an entity display string from literal text and property values.
///
/// ```ignore
/// let provider = StringProvider::new()
///     .value("ename")
///     .text(" (")
///     .foreign_key_value("dept_fk", "dname")
///     .text(")");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StringProvider {
    parts: Vec<Part>,
}

#[derive(Debug, Clone)]
enum Part {
    Text(String),
    Value(PropertyId),
    Formatted(PropertyId, String),
    ForeignKeyValue(PropertyId, PropertyId),
}

impl StringProvider {
    pub fn new() -> StringProvider {
        StringProvider::default()
    }

    /// A provider rendering the value of a single property.
    pub fn from_property(property: impl Into<PropertyId>) -> StringProvider {
        StringProvider::new().value(property)
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(Part::Text(text.into()));
        self
    }

    /// Appends the value of `property`, formatted the way the property specifies.
    pub fn value(mut self, property: impl Into<PropertyId>) -> Self {
        self.parts.push(Part::Value(property.into()));
        self
    }

    /// Appends the value of a temporal `property` rendered with the chrono `pattern`.
    pub fn formatted_value(mut self, property: impl Into<PropertyId>, pattern: impl Into<String>) -> Self {
        self.parts
            .push(Part::Formatted(property.into(), pattern.into()));
        self
    }

    /// Appends the value of `property` from the entity referenced by `foreign_key`.
    pub fn foreign_key_value(
        mut self,
        foreign_key: impl Into<PropertyId>,
        property: impl Into<PropertyId>,
    ) -> Self {
        self.parts
            .push(Part::ForeignKeyValue(foreign_key.into(), property.into()));
        self
    }

    /// Checks that every referenced property exists in `definition`.
    pub(crate) fn verify(&self, definition: &EntityDefinition) -> Result<()> {
        for part in &self.parts {
            let property = match part {
                Part::Text(_) => continue,
                Part::Value(property) | Part::Formatted(property, _) => property,
                Part::ForeignKeyValue(foreign_key, _) => {
                    let property = definition.property(foreign_key)?;
                    if !property.is_foreign_key() {
                        return Err(Error::not_a_foreign_key(
                            definition.id().as_str(),
                            foreign_key.as_str(),
                        ));
                    }
                    continue;
                }
            };
            definition.property(property)?;
        }
        Ok(())
    }

    fn render(&self, entity: &Entity) -> Result<String> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Value(property) => out.push_str(&entity.formatted(property)?),
                Part::Formatted(property, pattern) => {
                    out.push_str(&format_with(&*entity.get(property)?, pattern))
                }
                Part::ForeignKeyValue(foreign_key, property) => {
                    if let Value::Entity(referenced) = &*entity.get(foreign_key)? {
                        out.push_str(&referenced.formatted(property)?);
                    }
                }
            }
        }
        Ok(out)
    }
}

impl DisplayProvider for StringProvider {
    fn display(&self, entity: &Entity) -> String {
        // Property ids are checked when the provider is installed
        self.render(entity).unwrap_or_default()
    }
}

/// Formats temporal values with a chrono pattern. Other values use their default
/// rendering, null renders empty.
pub(crate) fn format_with(value: &Value, pattern: &str) -> String {
    match value {
        Value::Null => String::new(),
        Value::Date(date) => date.format(pattern).to_string(),
        Value::Time(time) => time.format(pattern).to_string(),
        Value::Timestamp(timestamp) => timestamp.format(pattern).to_string(),
        other => other.to_string(),
    }
}
