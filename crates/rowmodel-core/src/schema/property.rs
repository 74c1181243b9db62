mod builder;
pub use builder::{PropertyBuilder, ReferenceColumn};

use super::{EntityId, PropertyId, ValueConverter};
use crate::{SourceValues, Type, Value};
use std::fmt;
use std::rc::Rc;

/// Describes one attribute shared by all entities of a type.
///
/// Properties are created through the constructors on this type, which return a
/// [`PropertyBuilder`], and become immutable once the owning entity is defined.
#[derive(Debug, Clone)]
pub struct Property {
    pub(crate) id: PropertyId,

    pub(crate) ty: Type,

    /// Properties without a caption are hidden
    pub(crate) caption: Option<String>,

    pub(crate) description: Option<String>,

    pub(crate) nullable: bool,

    pub(crate) read_only: bool,

    pub(crate) default_value: Option<DefaultValue>,

    pub(crate) min: Option<f64>,

    pub(crate) max: Option<f64>,

    /// `None` means unbounded
    pub(crate) max_length: Option<usize>,

    /// Doubles and decimals are rounded to this many fraction digits when set
    pub(crate) maximum_fraction_digits: Option<u32>,

    /// A chrono format pattern for temporal properties
    pub(crate) format: Option<String>,

    pub(crate) kind: PropertyKind,
}

#[derive(Debug, Clone)]
pub enum PropertyKind {
    /// Maps to a physical column
    Column(Column),

    /// A column whose value is copied from an entity referenced by a foreign key
    Denormalized(Column, Denormalized),

    /// A column restricted to an enumerated set of values
    ValueList(Column, ValueList),

    /// A read-only column populated with insert/update time or user
    Audit(Column, Audit),

    /// A read-only column whose value is selected by a subquery
    Subquery(Column, Subquery),

    /// References another entity through one or more columns
    ForeignKey(ForeignKey),

    /// Not persisted
    Transient(Transient),

    /// Computed from other property values on every read
    Derived(Derived),
}

#[derive(Debug, Clone)]
pub struct Column {
    pub(crate) column_name: String,

    pub(crate) primary_key_index: Option<usize>,

    /// The database supplies a value on insert
    pub(crate) has_default: bool,

    pub(crate) updatable: bool,

    pub(crate) grouping: bool,

    pub(crate) aggregate: bool,

    pub(crate) selectable: bool,

    /// 1-based position in the select column list, assigned at definition time. Zero
    /// if the column is not selected.
    pub(crate) select_index: usize,

    /// The foreign key owning this column, if any
    pub(crate) foreign_key: Option<PropertyId>,

    pub(crate) converter: Option<Rc<dyn ValueConverter>>,
}

#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub(crate) foreign_entity: EntityId,

    /// Columns in the order of the referenced primary key
    pub(crate) references: Vec<Reference>,

    pub(crate) fetch_depth: Option<usize>,

    pub(crate) soft_reference: bool,
}

/// A column participating in a foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub(crate) column: PropertyId,

    /// The column value is owned by another property and not written by this foreign key
    pub(crate) mirror: bool,
}

#[derive(Debug, Clone)]
pub struct Denormalized {
    pub(crate) foreign_key: PropertyId,

    /// Property of the referenced entity to copy the value from
    pub(crate) source: PropertyId,
}

#[derive(Debug, Clone)]
pub struct ValueList {
    pub(crate) items: Vec<Item>,
}

/// A captioned value-list entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub value: Value,
    pub caption: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Audit {
    pub action: AuditAction,
    pub kind: AuditKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Insert,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditKind {
    Time,
    User,
}

#[derive(Debug, Clone)]
pub struct Subquery {
    pub(crate) query: String,
}

#[derive(Debug, Clone)]
pub struct Transient {
    /// A change to this property marks the owning entity as modified
    pub(crate) modifies_entity: bool,
}

#[derive(Debug, Clone)]
pub struct Derived {
    pub(crate) sources: Vec<PropertyId>,
    pub(crate) provider: DerivedValue,
}

/// Supplies the default value of a property.
#[derive(Clone)]
pub struct DefaultValue(pub(crate) Rc<dyn Fn() -> Value>);

/// Computes a derived value from its source values.
#[derive(Clone)]
pub struct DerivedValue(pub(crate) Rc<dyn Fn(&SourceValues<'_>) -> Value>);

impl Property {
    pub fn id(&self) -> &PropertyId {
        &self.id
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Hidden properties have no caption.
    pub fn is_hidden(&self) -> bool {
        self.caption.is_none()
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn has_default_value(&self) -> bool {
        self.default_value.is_some()
    }

    /// Returns the default value, `Value::Null` if none is specified.
    pub fn default_value(&self) -> Value {
        self.default_value
            .as_ref()
            .map(|default_value| (default_value.0)())
            .unwrap_or_default()
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    pub fn maximum_fraction_digits(&self) -> Option<u32> {
        self.maximum_fraction_digits
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    pub fn is_numerical(&self) -> bool {
        self.ty.is_numerical()
    }

    pub fn is_string(&self) -> bool {
        self.ty.is_string()
    }

    /// Returns the column attributes of every column-backed property kind.
    pub fn as_column(&self) -> Option<&Column> {
        match &self.kind {
            PropertyKind::Column(column)
            | PropertyKind::Denormalized(column, _)
            | PropertyKind::ValueList(column, _)
            | PropertyKind::Audit(column, _)
            | PropertyKind::Subquery(column, _) => Some(column),
            PropertyKind::ForeignKey(_) | PropertyKind::Transient(_) | PropertyKind::Derived(_) => {
                None
            }
        }
    }

    pub(crate) fn as_column_mut(&mut self) -> Option<&mut Column> {
        match &mut self.kind {
            PropertyKind::Column(column)
            | PropertyKind::Denormalized(column, _)
            | PropertyKind::ValueList(column, _)
            | PropertyKind::Audit(column, _)
            | PropertyKind::Subquery(column, _) => Some(column),
            PropertyKind::ForeignKey(_) | PropertyKind::Transient(_) | PropertyKind::Derived(_) => {
                None
            }
        }
    }

    pub fn is_column(&self) -> bool {
        self.as_column().is_some()
    }

    #[track_caller]
    pub fn expect_column(&self) -> &Column {
        match self.as_column() {
            Some(column) => column,
            None => panic!("expected column property, but was {self:?}"),
        }
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key_index().is_some()
    }

    pub fn primary_key_index(&self) -> Option<usize> {
        self.as_column().and_then(|column| column.primary_key_index)
    }

    /// Returns `true` if this is a column owned by a foreign key.
    pub fn is_foreign_key_column(&self) -> bool {
        self.as_column()
            .map(|column| column.foreign_key.is_some())
            .unwrap_or(false)
    }

    /// Returns `true` for updatable columns. Other property kinds are never updated.
    pub fn is_updatable(&self) -> bool {
        self.as_column()
            .map(|column| column.updatable)
            .unwrap_or(false)
    }

    pub fn as_foreign_key(&self) -> Option<&ForeignKey> {
        match &self.kind {
            PropertyKind::ForeignKey(foreign_key) => Some(foreign_key),
            _ => None,
        }
    }

    pub fn is_foreign_key(&self) -> bool {
        matches!(self.kind, PropertyKind::ForeignKey(_))
    }

    #[track_caller]
    pub fn expect_foreign_key(&self) -> &ForeignKey {
        match &self.kind {
            PropertyKind::ForeignKey(foreign_key) => foreign_key,
            _ => panic!("expected foreign key property, but was {self:?}"),
        }
    }

    pub fn as_denormalized(&self) -> Option<&Denormalized> {
        match &self.kind {
            PropertyKind::Denormalized(_, denormalized) => Some(denormalized),
            _ => None,
        }
    }

    pub fn is_denormalized(&self) -> bool {
        matches!(self.kind, PropertyKind::Denormalized(..))
    }

    pub fn as_value_list(&self) -> Option<&ValueList> {
        match &self.kind {
            PropertyKind::ValueList(_, value_list) => Some(value_list),
            _ => None,
        }
    }

    pub fn as_audit(&self) -> Option<&Audit> {
        match &self.kind {
            PropertyKind::Audit(_, audit) => Some(audit),
            _ => None,
        }
    }

    pub fn as_subquery(&self) -> Option<&Subquery> {
        match &self.kind {
            PropertyKind::Subquery(_, subquery) => Some(subquery),
            _ => None,
        }
    }

    pub fn as_transient(&self) -> Option<&Transient> {
        match &self.kind {
            PropertyKind::Transient(transient) => Some(transient),
            _ => None,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self.kind, PropertyKind::Transient(_))
    }

    pub fn as_derived(&self) -> Option<&Derived> {
        match &self.kind {
            PropertyKind::Derived(derived) => Some(derived),
            _ => None,
        }
    }

    pub fn is_derived(&self) -> bool {
        matches!(self.kind, PropertyKind::Derived(_))
    }
}

impl Column {
    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn primary_key_index(&self) -> Option<usize> {
        self.primary_key_index
    }

    pub fn has_default(&self) -> bool {
        self.has_default
    }

    pub fn is_updatable(&self) -> bool {
        self.updatable
    }

    pub fn is_grouping(&self) -> bool {
        self.grouping
    }

    pub fn is_aggregate(&self) -> bool {
        self.aggregate
    }

    pub fn is_selectable(&self) -> bool {
        self.selectable
    }

    /// 1-based position in the select column list, zero if the column is not selected.
    pub fn select_index(&self) -> usize {
        self.select_index
    }

    pub fn foreign_key(&self) -> Option<&PropertyId> {
        self.foreign_key.as_ref()
    }

    pub fn converter(&self) -> Option<&dyn ValueConverter> {
        self.converter.as_deref()
    }
}

impl ForeignKey {
    pub fn foreign_entity(&self) -> &EntityId {
        &self.foreign_entity
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// Returns the ids of the referencing columns, mirrors included.
    pub fn columns(&self) -> impl ExactSizeIterator<Item = &PropertyId> + '_ {
        self.references.iter().map(|reference| &reference.column)
    }

    pub fn is_composite(&self) -> bool {
        self.references.len() > 1
    }

    pub fn fetch_depth(&self) -> usize {
        self.fetch_depth.unwrap_or(1)
    }

    pub fn is_soft_reference(&self) -> bool {
        self.soft_reference
    }
}

impl Reference {
    pub fn column(&self) -> &PropertyId {
        &self.column
    }

    pub fn is_mirror(&self) -> bool {
        self.mirror
    }
}

impl Denormalized {
    pub fn foreign_key(&self) -> &PropertyId {
        &self.foreign_key
    }

    pub fn source(&self) -> &PropertyId {
        &self.source
    }
}

impl ValueList {
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Null is always a valid value-list value.
    pub fn is_valid(&self, value: &Value) -> bool {
        value.is_null() || self.items.iter().any(|item| item.value == *value)
    }

    pub fn caption(&self, value: &Value) -> Option<&str> {
        self.items
            .iter()
            .find(|item| item.value == *value)
            .map(|item| &item.caption[..])
    }
}

impl Item {
    pub fn new(value: impl Into<Value>, caption: impl Into<String>) -> Item {
        Item {
            value: value.into(),
            caption: caption.into(),
        }
    }
}

impl Subquery {
    pub fn query(&self) -> &str {
        &self.query
    }
}

impl Transient {
    pub fn modifies_entity(&self) -> bool {
        self.modifies_entity
    }
}

impl Derived {
    pub fn sources(&self) -> &[PropertyId] {
        &self.sources
    }

    pub fn compute(&self, sources: &SourceValues<'_>) -> Value {
        (self.provider.0)(sources)
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DefaultValue(..)")
    }
}

impl fmt::Debug for DerivedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedValue(..)")
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.caption {
            Some(caption) => f.write_str(caption),
            None => f.write_str(self.id.as_str()),
        }
    }
}
