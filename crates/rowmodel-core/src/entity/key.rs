use crate::schema::{Domain, EntityDefinition, EntityId, PropertyId};
use crate::{Error, Result, Type, Value, ValueMap};
use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// The primary key of an entity.
///
/// The hash code is cached and recomputed lazily after a component changes. A key with
/// a missing non-nullable component is null. Not thread safe.
#[derive(Clone)]
pub struct Key {
    domain: Rc<Domain>,

    index: usize,

    values: ValueMap<PropertyId, Value>,

    shape: KeyShape,

    /// `None` until computed, `Some(None)` for a null key
    hash: Cell<Option<Option<i32>>>,
}

/// How a key is composed, fixed by the entity definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyShape {
    /// A single `I32` column. The hash code is the value itself.
    SingleInteger,

    /// A single column of any other type
    Single,

    Composite,
}

impl Key {
    pub(crate) fn new(domain: Rc<Domain>, index: usize) -> Key {
        let shape = {
            let mut primary_key = domain.definition_at(index).primary_key_properties();
            match (primary_key.len(), primary_key.next()) {
                (1, Some(property)) if *property.ty() == Type::I32 => KeyShape::SingleInteger,
                (1, _) => KeyShape::Single,
                _ => KeyShape::Composite,
            }
        };

        Key {
            domain,
            index,
            values: ValueMap::new(),
            shape,
            hash: Cell::new(None),
        }
    }

    pub fn definition(&self) -> &EntityDefinition {
        self.domain.definition_at(self.index)
    }

    pub fn entity_id(&self) -> &EntityId {
        self.definition().id()
    }

    pub fn domain(&self) -> &Rc<Domain> {
        &self.domain
    }

    pub(super) fn index(&self) -> usize {
        self.index
    }

    pub fn shape(&self) -> KeyShape {
        self.shape
    }

    pub fn is_single_integer(&self) -> bool {
        self.shape == KeyShape::SingleInteger
    }

    pub fn is_composite(&self) -> bool {
        self.shape == KeyShape::Composite
    }

    /// Sets the value of the primary key column `id`.
    pub fn put(&mut self, id: impl AsRef<str>, value: impl Into<Value>) -> Result<()> {
        let id = id.as_ref();
        let value = value.into();

        let property = {
            let definition = self.definition();
            let property = definition.property(id)?;
            if !property.is_primary_key() {
                return Err(Error::unknown_property(
                    format!("{} primary key", definition.id()),
                    id,
                ));
            }
            property.id().clone()
        };

        if self.shape == KeyShape::SingleInteger && !matches!(value, Value::I32(_) | Value::Null) {
            return Err(Error::type_mismatch(id, "I32", value.type_name()));
        }

        self.insert(property, value);
        Ok(())
    }

    /// Stores a value already known to belong to a key column.
    pub(crate) fn insert(&mut self, id: PropertyId, value: Value) {
        match self.shape {
            KeyShape::SingleInteger => self.hash.set(Some(value.as_i32())),
            KeyShape::Single | KeyShape::Composite => self.hash.set(None),
        }
        self.values.put(id, value);
    }

    /// The value of key column `id`, `None` if it has not been set.
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.values.get(id)
    }

    pub fn values(&self) -> &ValueMap<PropertyId, Value> {
        &self.values
    }

    /// Returns `true` if a required component is missing.
    pub fn is_null(&self) -> bool {
        self.hash().is_none()
    }

    /// The cached hash code, 0 for a null key.
    pub fn hash_code(&self) -> i32 {
        self.hash().unwrap_or(0)
    }

    fn hash(&self) -> Option<i32> {
        if let Some(hash) = self.hash.get() {
            return hash;
        }

        let hash = self.compute_hash();
        self.hash.set(Some(hash));
        hash
    }

    fn compute_hash(&self) -> Option<i32> {
        let definition = self.definition();

        match self.shape {
            KeyShape::SingleInteger => definition
                .primary_key_properties()
                .next()
                .and_then(|property| self.value_of(property.id()))
                .and_then(Value::as_i32),
            KeyShape::Single => definition
                .primary_key_properties()
                .next()
                .and_then(|property| self.value_of(property.id()))
                .map(Value::hash_code),
            KeyShape::Composite => {
                let mut hash = 0i32;
                for property in definition.primary_key_properties() {
                    match self.value_of(property.id()) {
                        Some(value) => hash = hash.wrapping_add(value.hash_code()),
                        None if !property.is_nullable() => return None,
                        None => {}
                    }
                }
                Some(hash)
            }
        }
    }

    /// Non-null value of `id`
    fn value_of(&self, id: &str) -> Option<&Value> {
        self.values.get(id).filter(|value| !value.is_null())
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Key) -> bool {
        if self.domain.id() != other.domain.id() || self.entity_id() != other.entity_id() {
            return false;
        }

        match self.shape {
            KeyShape::SingleInteger => {
                other.shape == KeyShape::SingleInteger && self.hash() == other.hash()
            }
            KeyShape::Composite => {
                other.shape == KeyShape::Composite
                    && self
                        .definition()
                        .primary_key_properties()
                        .all(|property| self.value_of(property.id()) == other.value_of(property.id()))
            }
            KeyShape::Single => {
                other.shape != KeyShape::Composite
                    && self
                        .definition()
                        .primary_key_properties()
                        .next()
                        .map(|property| self.value_of(property.id()) == other.value_of(property.id()))
                        .unwrap_or(true)
            }
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i32(self.hash_code());
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, property) in self.definition().primary_key_properties().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match self.values.get(property.id().as_str()) {
                Some(value) => write!(f, "{}:{value}", property.id())?,
                None => write!(f, "{}:null", property.id())?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("entity_id", self.entity_id())
            .field("shape", &self.shape)
            .field("values", &self.values)
            .finish()
    }
}
