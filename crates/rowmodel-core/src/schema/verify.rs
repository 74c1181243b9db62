use super::{Domain, EntityDefinition, Property, PropertyKind};
use crate::{Error, Result};

use std::collections::HashSet;

struct Verify<'a> {
    definition: &'a EntityDefinition,
    domain: &'a Domain,
}

impl EntityDefinition {
    /// Checks the definition's internal consistency, and its foreign keys against the
    /// entities already defined in `domain`.
    pub(super) fn verify(&self, domain: &Domain) -> Result<()> {
        Verify {
            definition: self,
            domain,
        }
        .verify()
    }
}

impl Verify<'_> {
    fn verify(&self) -> Result<()> {
        self.verify_primary_key()?;

        for property in self.definition.properties() {
            self.verify_grouping(property)?;

            match property.kind() {
                PropertyKind::ForeignKey(_) => self.verify_foreign_key(property)?,
                PropertyKind::Derived(_) => self.verify_derived(property)?,
                PropertyKind::Denormalized(..) => self.verify_denormalized(property)?,
                _ => {}
            }
        }

        Ok(())
    }

    fn verify_primary_key(&self) -> Result<()> {
        let mut indices = HashSet::new();

        for property in self.definition.primary_key_properties() {
            let index = property.primary_key_index().unwrap_or_default();
            if !indices.insert(index) {
                return Err(self.invalid(format!(
                    "primary key index {index} is used more than once"
                )));
            }
        }

        if indices.is_empty() {
            return Err(self.invalid("no primary key defined"));
        }

        Ok(())
    }

    fn verify_grouping(&self, property: &Property) -> Result<()> {
        if let Some(column) = property.as_column() {
            if column.is_grouping() && column.is_aggregate() {
                return Err(self.invalid(format!(
                    "column `{}` can not be both grouping and aggregate",
                    property.id()
                )));
            }
        }
        Ok(())
    }

    fn verify_foreign_key(&self, property: &Property) -> Result<()> {
        let foreign_key = property.expect_foreign_key();
        let mut columns = HashSet::new();

        if foreign_key.references().is_empty() {
            return Err(self.invalid(format!(
                "foreign key `{}` has no columns",
                property.id()
            )));
        }

        for reference in foreign_key.references() {
            if !columns.insert(reference.column()) {
                return Err(self.invalid(format!(
                    "foreign key `{}` references column `{}` more than once",
                    property.id(),
                    reference.column()
                )));
            }

            let column = self.definition.property(reference.column()).map_err(|err| {
                err.context(self.invalid(format!(
                    "foreign key `{}` references `{}`, which is not defined",
                    property.id(),
                    reference.column()
                )))
            })?;
            if !column.is_column() {
                return Err(self.invalid(format!(
                    "foreign key `{}` references `{}`, which is not a column",
                    property.id(),
                    reference.column()
                )));
            }
        }

        let foreign_entity = foreign_key.foreign_entity();
        if !self.domain.settings().strict_foreign_keys || foreign_entity == self.definition.id() {
            return Ok(());
        }

        let Some(referenced) = self.domain.find_definition(foreign_entity.as_str()) else {
            return Err(self.invalid(format!(
                "foreign key `{}` references entity `{foreign_entity}`, which has not been defined",
                property.id()
            )));
        };

        let expected = referenced.primary_key_properties().len();
        if expected != foreign_key.references().len() {
            return Err(self.invalid(format!(
                "foreign key `{}` has {} columns, but the primary key of `{foreign_entity}` has {expected}",
                property.id(),
                foreign_key.references().len(),
            )));
        }

        Ok(())
    }

    fn verify_derived(&self, property: &Property) -> Result<()> {
        let Some(derived) = property.as_derived() else {
            return Ok(());
        };

        if derived.sources().is_empty() {
            return Err(self.invalid(format!(
                "derived property `{}` has no source properties",
                property.id()
            )));
        }

        for source in derived.sources() {
            self.definition.property(source).map_err(|err| {
                err.context(self.invalid(format!(
                    "derived property `{}` depends on an unknown property",
                    property.id()
                )))
            })?;
        }

        Ok(())
    }

    fn verify_denormalized(&self, property: &Property) -> Result<()> {
        let Some(denormalized) = property.as_denormalized() else {
            return Ok(());
        };

        let foreign_key = self
            .definition
            .foreign_key_property(denormalized.foreign_key())
            .map_err(|err| {
                err.context(self.invalid(format!(
                    "denormalized property `{}` is not backed by a foreign key",
                    property.id()
                )))
            })?
            .expect_foreign_key();

        // The source can only be checked once the referenced entity is defined
        let foreign_entity = foreign_key.foreign_entity();
        let referenced = if foreign_entity == self.definition.id() {
            Some(self.definition)
        } else {
            self.domain.find_definition(foreign_entity.as_str())
        };
        let Some(referenced) = referenced else {
            return Ok(());
        };

        let source = referenced.property(denormalized.source()).map_err(|err| {
            err.context(self.invalid(format!(
                "denormalized property `{}` copies an unknown property",
                property.id()
            )))
        })?;

        if source.ty() != property.ty() {
            return Err(self.invalid(format!(
                "denormalized property `{}` is {}, but its source `{foreign_entity}.{}` is {}",
                property.id(),
                property.ty(),
                source.id(),
                source.ty()
            )));
        }

        Ok(())
    }

    fn invalid(&self, message: impl Into<String>) -> Error {
        Error::invalid_definition(format!(
            "entity `{}`: {}",
            self.definition.id(),
            message.into()
        ))
    }
}
