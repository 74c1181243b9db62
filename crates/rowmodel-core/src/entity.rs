mod key;
pub use key::{Key, KeyShape};

mod source_values;
pub use source_values::SourceValues;

use crate::schema::{Derived, Domain, EntityDefinition, EntityId, ForeignKey, Property, PropertyId, PropertyKind};
use crate::{Error, Result, Type, Value, ValueChange, ValueMap};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use std::borrow::Cow;
use std::cell::{OnceCell, RefCell};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// One row instance: a map from property id to value, bound to an entity definition.
///
/// Writes go through [`Entity::put`], which type-checks the value and propagates it to
/// foreign key columns and denormalized properties. Derived properties are computed on
/// every read.
///
/// Entities are identified by their primary key alone. The key, display string and
/// referenced keys are cached lazily, so an entity must not be shared across threads
/// while it may still fill a cache.
pub struct Entity {
    domain: Rc<Domain>,

    index: usize,

    values: ValueMap<PropertyId, Value>,

    key: OnceCell<Key>,

    display: OnceCell<String>,

    /// Keys resolved from foreign key columns, `None` for a null reference
    referenced_keys: RefCell<HashMap<PropertyId, Option<Key>>>,
}

impl Entity {
    pub(crate) fn new(domain: Rc<Domain>, index: usize) -> Entity {
        Entity::with_values(domain, index, ValueMap::new())
    }

    pub(crate) fn from_parts(
        domain: Rc<Domain>,
        index: usize,
        values: IndexMap<PropertyId, Value>,
        originals: IndexMap<PropertyId, Value>,
    ) -> Entity {
        Entity::with_values(domain, index, ValueMap::from_parts(values, originals))
    }

    fn with_values(domain: Rc<Domain>, index: usize, values: ValueMap<PropertyId, Value>) -> Entity {
        Entity {
            domain,
            index,
            values,
            key: OnceCell::new(),
            display: OnceCell::new(),
            referenced_keys: RefCell::new(HashMap::new()),
        }
    }

    /// Creates an entity holding only the values of `key`.
    pub fn from_key(key: &Key) -> Entity {
        let mut entity = Entity::new(Rc::clone(key.domain()), key.index());
        for (id, value) in key.values().iter() {
            entity.values.put(id.clone(), value.clone());
        }
        entity
    }

    pub fn domain(&self) -> &Rc<Domain> {
        &self.domain
    }

    pub fn definition(&self) -> &EntityDefinition {
        self.domain.definition_at(self.index)
    }

    pub fn entity_id(&self) -> &EntityId {
        self.definition().id()
    }

    /// The stored values. Derived properties never have a stored value.
    pub fn values(&self) -> &ValueMap<PropertyId, Value> {
        &self.values
    }

    /// Returns the value of property `id`. Absent values read as null.
    ///
    /// A foreign key without a stored entity but with non-null columns reads as an
    /// entity holding only the referenced key.
    pub fn get(&self, id: impl AsRef<str>) -> Result<Cow<'_, Value>> {
        let property = self.definition().property(id)?;

        match property.kind() {
            PropertyKind::Derived(derived) => Ok(Cow::Owned(self.derive(derived)?)),
            PropertyKind::ForeignKey(_) => self.get_foreign_key(property),
            _ => Ok(self.stored(property.id())),
        }
    }

    fn stored(&self, id: &str) -> Cow<'_, Value> {
        match self.values.get(id) {
            Some(value) => Cow::Borrowed(value),
            None => Cow::Owned(Value::Null),
        }
    }

    fn derive(&self, derived: &Derived) -> Result<Value> {
        let sources = match derived.sources() {
            [source] => SourceValues::Single(source.as_str(), self.get(source)?),
            sources => {
                let mut values = IndexMap::with_capacity(sources.len());
                for source in sources {
                    values.insert(source.as_str(), self.get(source)?);
                }
                SourceValues::Many(values)
            }
        };

        Ok(derived.compute(&sources))
    }

    fn get_foreign_key(&self, property: &Property) -> Result<Cow<'_, Value>> {
        if let Some(value) = self.values.get(property.id().as_str()) {
            if !value.is_null() {
                return Ok(Cow::Borrowed(value));
            }
        }

        Ok(match self.referenced_key(property.id())? {
            Some(key) => Cow::Owned(Value::from(Entity::from_key(&key))),
            None => Cow::Owned(Value::Null),
        })
    }

    /// Returns `true` if the value of `id` is null.
    ///
    /// A foreign key is null when its referenced key can not be resolved: its single
    /// column is null, a non-nullable column of a composite key is null, or every column
    /// is null.
    pub fn is_null(&self, id: impl AsRef<str>) -> Result<bool> {
        let definition = self.definition();
        let property = definition.property(id)?;

        let Some(foreign_key) = property.as_foreign_key() else {
            return Ok(self.get(property.id())?.is_null());
        };

        let mut all_null = true;
        for reference in foreign_key.references() {
            let column = definition.property(reference.column())?;
            let null = self.stored(column.id()).is_null();
            if null && (!foreign_key.is_composite() || !column.is_nullable()) {
                return Ok(true);
            }
            all_null &= null;
        }

        Ok(all_null)
    }

    /// Returns `true` if the entity referenced by foreign key `id` is stored, as
    /// opposed to being resolved from its key columns.
    pub fn is_loaded(&self, id: impl AsRef<str>) -> Result<bool> {
        let property = self.definition().foreign_key_property(id)?;
        Ok(matches!(
            self.values.get(property.id().as_str()),
            Some(Value::Entity(_))
        ))
    }

    /// Sets the value of property `id`, returning the previous value.
    pub fn put(&mut self, id: impl AsRef<str>, value: impl Into<Value>) -> Result<Option<Value>> {
        let domain = Rc::clone(&self.domain);
        let definition = domain.definition_at(self.index);
        let property = definition.property(id)?;

        let value = prepare(property, value.into())?;
        self.put_property(definition, property, value)
    }

    fn put_property(
        &mut self,
        definition: &EntityDefinition,
        property: &Property,
        value: Value,
    ) -> Result<Option<Value>> {
        if property.is_primary_key() {
            self.key.take();
        }
        self.display.take();

        if let Some(foreign_key) = property.as_foreign_key() {
            self.propagate_reference(definition, property, foreign_key, value.as_entity())?;
        }
        self.forget_referenced_keys(definition, property);

        let changed = self.values.get(property.id().as_str()) != Some(&value);
        let previous = self.values.put(property.id().clone(), value);

        if changed && self.values.has_listeners() && definition.has_derived_properties() {
            self.notify_derived(definition, property.id())?;
        }

        Ok(previous)
    }

    /// Copies the referenced primary key into the foreign key columns, then the
    /// denormalized values. A null reference clears both. Nothing is written unless
    /// every value is accepted by its property.
    fn propagate_reference(
        &mut self,
        definition: &EntityDefinition,
        property: &Property,
        foreign_key: &ForeignKey,
        referenced: Option<&Entity>,
    ) -> Result<()> {
        let mut propagated = vec![];

        for (position, reference) in foreign_key.references().iter().enumerate() {
            if reference.is_mirror() {
                continue;
            }

            let column = definition.property(reference.column())?;
            let value = match referenced {
                Some(entity) => match entity.definition().primary_key_properties().nth(position) {
                    Some(primary_key) => entity.get(primary_key.id())?.into_owned(),
                    None => Value::Null,
                },
                None => Value::Null,
            };
            propagated.push((column, prepare(column, value)?));
        }

        for id in definition.denormalized_properties(property.id()) {
            let denormalized = definition.property(id)?;
            let value = match (referenced, denormalized.as_denormalized()) {
                (Some(entity), Some(source)) => entity.get(source.source())?.into_owned(),
                _ => Value::Null,
            };
            propagated.push((denormalized, prepare(denormalized, value)?));
        }

        for (property, value) in propagated {
            self.put_property(definition, property, value)?;
        }

        Ok(())
    }

    /// Drops the cached referenced keys that depend on `property`: its own if it is a
    /// foreign key, or those of every foreign key referencing it as a column, mirrors
    /// included.
    fn forget_referenced_keys(&mut self, definition: &EntityDefinition, property: &Property) {
        let referenced_keys = self.referenced_keys.get_mut();
        if referenced_keys.is_empty() {
            return;
        }

        if property.is_foreign_key() {
            referenced_keys.remove(property.id().as_str());
        } else if property.is_column() {
            for foreign_key in definition.foreign_key_properties() {
                if foreign_key
                    .as_foreign_key()
                    .is_some_and(|fk| fk.columns().any(|column| column == property.id()))
                {
                    referenced_keys.remove(foreign_key.id().as_str());
                }
            }
        }
    }

    /// Reports the recomputed value of every derived property depending on `source`.
    fn notify_derived(&self, definition: &EntityDefinition, source: &PropertyId) -> Result<()> {
        for id in definition.derived_properties(source) {
            let value = self.get(id)?;
            self.values.notify(&ValueChange {
                key: id,
                value: &*value,
                previous: Some(&*value),
                initialization: false,
            });
        }
        Ok(())
    }

    /// Removes the value of property `id`. Removing a foreign key removes its columns
    /// as well.
    pub fn remove(&mut self, id: impl AsRef<str>) -> Result<Option<Value>> {
        let domain = Rc::clone(&self.domain);
        let definition = domain.definition_at(self.index);
        let property = definition.property(id)?;

        if let Some(foreign_key) = property.as_foreign_key() {
            for column in foreign_key.columns() {
                self.values.remove(column.as_str());
            }
        }
        self.forget_referenced_keys(definition, property);
        if property.is_primary_key() {
            self.key.take();
        }
        self.display.take();

        Ok(self.values.remove(property.id().as_str()))
    }

    /// Returns `true` if a modification is relevant to persistence.
    ///
    /// Modified properties are scanned in modification order. The first updatable,
    /// writable column decides `true`; the first transient property decides with its
    /// `modifies_entity` flag. Other properties do not decide.
    pub fn is_modified(&self) -> bool {
        if !self.values.is_modified() {
            return false;
        }

        let definition = self.definition();
        for id in self.values.original_keys() {
            let Some(property) = definition.find_property(id) else {
                continue;
            };

            if let Some(column) = property.as_column() {
                if !property.is_read_only() && column.is_updatable() {
                    return true;
                }
            } else if let Some(transient) = property.as_transient() {
                return transient.modifies_entity();
            }
        }

        false
    }

    pub fn is_modified_property(&self, id: impl AsRef<str>) -> bool {
        self.values.is_modified_key(id.as_ref())
    }

    /// The original value of `id` if it has been modified, otherwise the current value.
    pub fn original(&self, id: impl AsRef<str>) -> Value {
        self.values.original(id.as_ref()).cloned().unwrap_or_default()
    }

    /// Accepts the current value of `id` as its original.
    pub fn save(&mut self, id: impl AsRef<str>) {
        self.values.save(id.as_ref());
    }

    pub fn save_all(&mut self) {
        self.values.save_all();
    }

    /// Restores the original value of `id`.
    pub fn revert(&mut self, id: impl AsRef<str>) {
        self.values.revert(id.as_ref());
        self.clear_caches();
    }

    pub fn revert_all(&mut self) {
        self.values.revert_all();
        self.clear_caches();
    }

    /// Replaces every value of this entity with a copy of `other`'s, originals
    /// included.
    pub fn set_as(&mut self, other: &Entity) -> Result<()> {
        if self.entity_id() != other.entity_id() {
            crate::bail!(
                "can not set an entity of type `{}` as `{}`",
                self.entity_id(),
                other.entity_id()
            );
        }
        self.values.set_as(&other.values);
        self.clear_caches();
        Ok(())
    }

    /// Removes every primary key value.
    pub fn clear_key_values(&mut self) {
        let domain = Rc::clone(&self.domain);
        for property in domain.definition_at(self.index).primary_key_properties() {
            self.values.remove(property.id().as_str());
        }
        self.clear_caches();
    }

    fn clear_caches(&mut self) {
        self.key.take();
        self.display.take();
        self.referenced_keys.get_mut().clear();
    }

    /// The primary key, reflecting the current key values.
    pub fn key(&self) -> &Key {
        self.key.get_or_init(|| self.build_key(false))
    }

    /// The primary key built from original key values.
    pub fn original_key(&self) -> Key {
        self.build_key(true)
    }

    fn build_key(&self, original: bool) -> Key {
        let mut key = Key::new(Rc::clone(&self.domain), self.index);
        for property in self.definition().primary_key_properties() {
            let id = property.id().as_str();
            let value = if original {
                self.values.original(id)
            } else {
                self.values.get(id)
            };
            key.insert(property.id().clone(), value.cloned().unwrap_or_default());
        }
        key
    }

    /// Resolves the key of the entity referenced by foreign key `id` from its columns.
    /// Returns `None` if the reference is null.
    pub fn referenced_key(&self, id: impl AsRef<str>) -> Result<Option<Key>> {
        let property = self.definition().foreign_key_property(id)?;

        if let Some(key) = self.referenced_keys.borrow().get(property.id().as_str()) {
            return Ok(key.clone());
        }

        let key = self.resolve_referenced_key(property)?;
        self.referenced_keys
            .borrow_mut()
            .insert(property.id().clone(), key.clone());
        Ok(key)
    }

    fn resolve_referenced_key(&self, property: &Property) -> Result<Option<Key>> {
        if self.is_null(property.id())? {
            return Ok(None);
        }

        let foreign_key = property.expect_foreign_key();
        let mut key = self.domain.key(foreign_key.foreign_entity())?;
        let primary_key: Vec<PropertyId> = key
            .definition()
            .primary_key_properties()
            .map(|property| property.id().clone())
            .collect();

        for (reference, id) in foreign_key.references().iter().zip(primary_key) {
            let value = self.stored(reference.column()).into_owned();
            key.put(id, value)?;
        }

        Ok(Some(key))
    }

    /// Returns `true` if every column value equals the one in `other`. Blob columns are
    /// not compared since they are not loaded eagerly.
    pub fn values_equal(&self, other: &Entity) -> bool {
        self.definition()
            .column_properties()
            .filter(|property| !property.ty().is_blob())
            .all(|property| self.stored(property.id()) == other.stored(property.id()))
    }

    pub fn get_bool(&self, id: impl AsRef<str>) -> Result<Option<bool>> {
        Ok(self.get(id)?.as_bool())
    }

    pub fn get_i32(&self, id: impl AsRef<str>) -> Result<Option<i32>> {
        Ok(self.get(id)?.as_i32())
    }

    pub fn get_i64(&self, id: impl AsRef<str>) -> Result<Option<i64>> {
        Ok(self.get(id)?.as_i64())
    }

    pub fn get_f64(&self, id: impl AsRef<str>) -> Result<Option<f64>> {
        Ok(self.get(id)?.as_f64())
    }

    pub fn get_decimal(&self, id: impl AsRef<str>) -> Result<Option<Decimal>> {
        Ok(self.get(id)?.as_decimal().copied())
    }

    pub fn get_string(&self, id: impl AsRef<str>) -> Result<Option<String>> {
        Ok(self.get(id)?.as_str().map(str::to_string))
    }

    pub fn get_date(&self, id: impl AsRef<str>) -> Result<Option<NaiveDate>> {
        Ok(self.get(id)?.as_date())
    }

    pub fn get_time(&self, id: impl AsRef<str>) -> Result<Option<NaiveTime>> {
        Ok(self.get(id)?.as_time())
    }

    pub fn get_timestamp(&self, id: impl AsRef<str>) -> Result<Option<NaiveDateTime>> {
        Ok(self.get(id)?.as_timestamp())
    }

    /// The entity referenced by foreign key `id`.
    pub fn get_entity(&self, id: impl AsRef<str>) -> Result<Option<Entity>> {
        Ok(match self.get(id)?.into_owned() {
            Value::Entity(entity) => Some(*entity),
            _ => None,
        })
    }

    /// Renders the value of `id` for presentation. Null renders empty, value list items
    /// render their caption and referenced entities their display string.
    pub fn formatted(&self, id: impl AsRef<str>) -> Result<String> {
        let definition = self.definition();
        let property = definition.property(id)?;
        let value = self.get(property.id())?;

        if let Value::Entity(entity) = &*value {
            return Ok(entity.to_string());
        }

        let settings = self.domain.settings();
        let pattern = match property.ty() {
            Type::Date => settings.date_format.as_str(),
            Type::Time => settings.time_format.as_str(),
            Type::Timestamp => settings.timestamp_format.as_str(),
            _ => "",
        };
        Ok(definition.format_value(property, &value, pattern))
    }

    /// Validates this entity with its definition's validator.
    pub fn validate(&self) -> Result<()> {
        self.definition().validator().validate(self)
    }

    /// The background color of `property` provided by the definition, if any.
    pub fn background_color(&self, id: impl AsRef<str>) -> Result<Option<String>> {
        let definition = self.definition();
        Ok(definition.background_color(self, definition.property(id)?))
    }

    pub fn hash_code(&self) -> i32 {
        self.key().hash_code()
    }

    /// Installs a listener notified of every effective value change.
    pub fn add_listener(&mut self, listener: impl Fn(&ValueChange<'_, PropertyId, Value>) + 'static) {
        self.values.add_listener(listener);
    }
}

/// Checks `value` against `property` and rounds fractional numbers.
fn prepare(property: &Property, value: Value) -> Result<Value> {
    if property.is_derived() {
        return Err(Error::read_only_property(property.id().as_str()));
    }

    if let Some(value_list) = property.as_value_list() {
        if !value_list.is_valid(&value) {
            return Err(Error::invalid_value_list_item(
                property.id().as_str(),
                value.to_string(),
            ));
        }
    }

    if !value.is_a(property.ty()) {
        return Err(Error::type_mismatch(
            property.id().as_str(),
            property.ty().to_string(),
            value.type_name(),
        ));
    }

    Ok(match (value, property.maximum_fraction_digits()) {
        (Value::F64(v), Some(digits)) => Value::F64(round(v, digits)),
        (Value::Decimal(v), Some(digits)) => Value::Decimal(v.round_dp(digits).normalize()),
        (value, _) => value,
    })
}

fn round(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits.min(i32::MAX as u32) as i32);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(display) = self.display.get() {
            return f.write_str(display);
        }

        let display = self.definition().display(self);
        f.write_str(&display)?;
        let _ = self.display.set(display);
        Ok(())
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("entity_id", self.entity_id())
            .field("values", &self.values)
            .finish()
    }
}

impl Clone for Entity {
    fn clone(&self) -> Entity {
        Entity::with_values(Rc::clone(&self.domain), self.index, self.values.clone())
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Entity) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Entity {
    fn partial_cmp(&self, other: &Entity) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entity {
    fn cmp(&self, other: &Entity) -> Ordering {
        self.definition().compare(self, other)
    }
}
