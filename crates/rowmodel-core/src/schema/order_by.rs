use super::PropertyId;
use crate::Result;

/// The default ordering of an entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBy {
    properties: Vec<OrderByProperty>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByProperty {
    pub property: PropertyId,
    pub descending: bool,
}

impl OrderBy {
    pub fn new() -> OrderBy {
        OrderBy::default()
    }

    /// Appends `properties` in ascending order. Each property may appear only once.
    pub fn ascending<I>(self, properties: I) -> Result<OrderBy>
    where
        I: IntoIterator,
        I::Item: Into<PropertyId>,
    {
        self.add(false, properties)
    }

    /// Appends `properties` in descending order. Each property may appear only once.
    pub fn descending<I>(self, properties: I) -> Result<OrderBy>
    where
        I: IntoIterator,
        I::Item: Into<PropertyId>,
    {
        self.add(true, properties)
    }

    fn add<I>(mut self, descending: bool, properties: I) -> Result<OrderBy>
    where
        I: IntoIterator,
        I::Item: Into<PropertyId>,
    {
        for property in properties {
            let property = property.into();
            if self.properties.iter().any(|p| p.property == property) {
                return Err(crate::Error::invalid_definition(format!(
                    "order by already contains property `{property}`"
                )));
            }
            self.properties.push(OrderByProperty {
                property,
                descending,
            });
        }
        Ok(self)
    }

    pub fn properties(&self) -> &[OrderByProperty] {
        &self.properties
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
