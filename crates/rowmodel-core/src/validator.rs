//! Null, range and length checks applied to entity values.

use crate::schema::Property;
use crate::{Entity, Error, Result};
use std::cell::RefCell;
use std::fmt;

/// Validates entities of one type.
///
/// Every method has a default, so an implementation only overrides the checks it wants
/// to change.
pub trait Validator: fmt::Debug {
    /// Validates every property of `entity` that is not read-only.
    fn validate(&self, entity: &Entity) -> Result<()> {
        for property in entity.definition().properties() {
            if !property.is_read_only() {
                self.validate_property(entity, property)?;
            }
        }
        Ok(())
    }

    fn validate_all(&self, entities: &[Entity]) -> Result<()> {
        for entity in entities {
            self.validate(entity)?;
        }
        Ok(())
    }

    /// Applies the null check, then the range check for numerical properties or the
    /// length check for string properties.
    ///
    /// Columns belonging to a foreign key are not null checked on their own; the foreign
    /// key is checked instead.
    fn validate_property(&self, entity: &Entity, property: &Property) -> Result<()> {
        if self.performs_null_validation() && !property.is_foreign_key_column() {
            self.null_check(entity, property)?;
        }

        if property.is_numerical() {
            self.range_check(entity, property)
        } else if property.is_string() {
            self.length_check(entity, property)
        } else {
            Ok(())
        }
    }

    fn performs_null_validation(&self) -> bool {
        true
    }

    fn is_nullable(&self, _entity: &Entity, property: &Property) -> bool {
        property.is_nullable()
    }

    fn is_valid(&self, entity: &Entity) -> bool {
        self.validate(entity).is_ok()
    }

    /// Fails if a non-nullable property is null.
    ///
    /// While the entity has no complete key, a column the database fills in is allowed
    /// to be null: a non-key column with a column default, or a key column of a generated
    /// key.
    fn null_check(&self, entity: &Entity, property: &Property) -> Result<()> {
        if self.is_nullable(entity, property) || !entity.is_null(property.id())? {
            return Ok(());
        }

        let is_new = entity.key().is_null() || entity.original_key().is_null();
        if is_new && !property.is_foreign_key() {
            if let Some(column) = property.as_column() {
                let primary_key = column.primary_key_index().is_some();
                if !primary_key && column.has_default() {
                    return Ok(());
                }
                if primary_key && !entity.definition().key_generator_kind().is_manual() {
                    return Ok(());
                }
            }
        }

        Err(Error::validation_null(property.id().as_str()))
    }

    /// Fails if a numerical value lies outside the property's bounds. Nulls pass.
    fn range_check(&self, entity: &Entity, property: &Property) -> Result<()> {
        let Some(value) = entity.get(property.id())?.to_f64() else {
            return Ok(());
        };

        let min = property.min().unwrap_or(f64::NEG_INFINITY);
        let max = property.max().unwrap_or(f64::INFINITY);
        if value < min || value > max {
            return Err(Error::validation_range(
                property.id().as_str(),
                value,
                property.min(),
                property.max(),
            ));
        }

        Ok(())
    }

    /// Fails if a string is longer than the property's maximum length. Nulls pass.
    fn length_check(&self, entity: &Entity, property: &Property) -> Result<()> {
        let Some(max_length) = property.max_length() else {
            return Ok(());
        };

        let value = entity.get(property.id())?;
        let Some(string) = value.as_str() else {
            return Ok(());
        };

        let len = string.chars().count();
        if len > max_length {
            return Err(Error::validation_length(
                property.id().as_str(),
                len,
                max_length,
            ));
        }

        Ok(())
    }

    /// Notifies interested parties that validation results may have changed.
    fn revalidate(&self) {}

    /// Registers a callback run by [`Validator::revalidate`].
    fn add_revalidate_listener(&self, _listener: Box<dyn Fn()>) {}
}

/// The validator installed on every definition unless another one is configured.
pub struct DefaultValidator {
    perform_null_validation: bool,
    listeners: RefCell<Vec<Box<dyn Fn()>>>,
}

impl DefaultValidator {
    pub fn new() -> DefaultValidator {
        DefaultValidator {
            perform_null_validation: true,
            listeners: RefCell::new(vec![]),
        }
    }

    /// A validator that only applies range and length checks.
    pub fn without_null_validation() -> DefaultValidator {
        DefaultValidator {
            perform_null_validation: false,
            ..DefaultValidator::new()
        }
    }
}

impl Default for DefaultValidator {
    fn default() -> Self {
        DefaultValidator::new()
    }
}

impl Validator for DefaultValidator {
    fn performs_null_validation(&self) -> bool {
        self.perform_null_validation
    }

    fn revalidate(&self) {
        for listener in self.listeners.borrow().iter() {
            listener();
        }
    }

    fn add_revalidate_listener(&self, listener: Box<dyn Fn()>) {
        self.listeners.borrow_mut().push(listener);
    }
}

impl fmt::Debug for DefaultValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultValidator")
            .field("perform_null_validation", &self.perform_null_validation)
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}
