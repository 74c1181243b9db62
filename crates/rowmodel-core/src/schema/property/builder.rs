use super::{
    Audit, AuditAction, AuditKind, Column, DefaultValue, Denormalized, Derived, DerivedValue,
    ForeignKey, Item, Property, PropertyKind, Subquery, Transient, ValueList,
};
use crate::schema::{EntityId, PropertyId, ValueConverter};
use crate::{SourceValues, Type, Value};
use std::rc::Rc;

/// Configures a [`Property`] before it is handed to [`Domain::define`].
///
/// Setters that do not apply to the property kind are recorded and reported as an
/// invalid definition when the entity is defined.
///
/// [`Domain::define`]: crate::schema::Domain::define
#[derive(Debug)]
pub struct PropertyBuilder {
    pub(crate) property: Property,

    /// Referencing columns of a foreign key
    pub(crate) references: Vec<ReferenceColumn>,

    pub(crate) misuse: Vec<String>,
}

/// A column referenced by a foreign key property.
#[derive(Debug)]
pub enum ReferenceColumn {
    /// A column owned by the foreign key
    Owned(PropertyBuilder),

    /// A column defined elsewhere in the entity, written only by its owner
    Mirror(PropertyId),
}

impl Property {
    /// A column property.
    pub fn column(id: impl Into<PropertyId>, ty: Type) -> PropertyBuilder {
        PropertyBuilder::new(id.into(), ty, PropertyKind::Column(Column::default()))
    }

    /// A primary key column with index 0. Primary key columns are neither nullable nor
    /// updatable unless configured otherwise.
    pub fn primary_key(id: impl Into<PropertyId>, ty: Type) -> PropertyBuilder {
        Property::column(id, ty).primary_key_index(0)
    }

    /// A foreign key referencing `foreign_entity` through `columns`, listed in the
    /// order of the referenced primary key.
    pub fn foreign_key<I>(
        id: impl Into<PropertyId>,
        foreign_entity: impl Into<EntityId>,
        columns: I,
    ) -> PropertyBuilder
    where
        I: IntoIterator,
        I::Item: Into<ReferenceColumn>,
    {
        let foreign_entity = foreign_entity.into();
        let mut builder = PropertyBuilder::new(
            id.into(),
            Type::Entity(foreign_entity.clone()),
            PropertyKind::ForeignKey(ForeignKey {
                foreign_entity,
                references: vec![],
                fetch_depth: None,
                soft_reference: false,
            }),
        );
        builder.references = columns.into_iter().map(Into::into).collect();
        builder
    }

    /// A foreign key column whose value is owned by the property `id` defined elsewhere
    /// in the same entity.
    pub fn mirror(id: impl Into<PropertyId>) -> ReferenceColumn {
        ReferenceColumn::Mirror(id.into())
    }

    /// A column whose value is copied from the `source` property of the entity
    /// referenced by `foreign_key`.
    pub fn denormalized(
        id: impl Into<PropertyId>,
        foreign_key: impl Into<PropertyId>,
        source: impl Into<PropertyId>,
        ty: Type,
    ) -> PropertyBuilder {
        PropertyBuilder::new(
            id.into(),
            ty,
            PropertyKind::Denormalized(
                Column::default(),
                Denormalized {
                    foreign_key: foreign_key.into(),
                    source: source.into(),
                },
            ),
        )
    }

    /// A column restricted to the values of `items`.
    pub fn value_list(
        id: impl Into<PropertyId>,
        ty: Type,
        items: impl IntoIterator<Item = Item>,
    ) -> PropertyBuilder {
        PropertyBuilder::new(
            id.into(),
            ty,
            PropertyKind::ValueList(
                Column::default(),
                ValueList {
                    items: items.into_iter().collect(),
                },
            ),
        )
    }

    /// A property that is not persisted.
    pub fn transient(id: impl Into<PropertyId>, ty: Type) -> PropertyBuilder {
        PropertyBuilder::new(
            id.into(),
            ty,
            PropertyKind::Transient(Transient {
                modifies_entity: true,
            }),
        )
    }

    /// A read-only property computed by `provider` from the values of `sources`.
    pub fn derived<I, F>(id: impl Into<PropertyId>, ty: Type, sources: I, provider: F) -> PropertyBuilder
    where
        I: IntoIterator,
        I::Item: Into<PropertyId>,
        F: Fn(&SourceValues<'_>) -> Value + 'static,
    {
        let mut builder = PropertyBuilder::new(
            id.into(),
            ty,
            PropertyKind::Derived(Derived {
                sources: sources.into_iter().map(Into::into).collect(),
                provider: DerivedValue(Rc::new(provider)),
            }),
        );
        builder.property.read_only = true;
        builder
    }

    /// A read-only column selected with `query`.
    pub fn subquery(id: impl Into<PropertyId>, ty: Type, query: impl Into<String>) -> PropertyBuilder {
        let column = Column {
            updatable: false,
            ..Column::default()
        };
        let mut builder = PropertyBuilder::new(
            id.into(),
            ty,
            PropertyKind::Subquery(
                column,
                Subquery {
                    query: query.into(),
                },
            ),
        );
        builder.property.read_only = true;
        builder
    }

    /// A read-only timestamp column set when a row is inserted or updated.
    pub fn audit_time(id: impl Into<PropertyId>, action: AuditAction) -> PropertyBuilder {
        Property::audit(id.into(), Type::Timestamp, action, AuditKind::Time)
    }

    /// A read-only column holding the user that inserted or updated a row.
    pub fn audit_user(id: impl Into<PropertyId>, action: AuditAction) -> PropertyBuilder {
        Property::audit(id.into(), Type::String, action, AuditKind::User)
    }

    fn audit(id: PropertyId, ty: Type, action: AuditAction, kind: AuditKind) -> PropertyBuilder {
        let mut builder = PropertyBuilder::new(
            id,
            ty,
            PropertyKind::Audit(Column::default(), Audit { action, kind }),
        );
        builder.property.read_only = true;
        builder
    }
}

impl Default for Column {
    fn default() -> Self {
        Column {
            column_name: String::new(),
            primary_key_index: None,
            has_default: false,
            updatable: true,
            grouping: false,
            aggregate: false,
            selectable: true,
            select_index: 0,
            foreign_key: None,
            converter: None,
        }
    }
}

impl PropertyBuilder {
    fn new(id: PropertyId, ty: Type, kind: PropertyKind) -> PropertyBuilder {
        PropertyBuilder {
            property: Property {
                id,
                ty,
                caption: None,
                description: None,
                nullable: true,
                read_only: false,
                default_value: None,
                min: None,
                max: None,
                max_length: None,
                maximum_fraction_digits: None,
                format: None,
                kind,
            },
            references: vec![],
            misuse: vec![],
        }
    }

    pub fn id(&self) -> &PropertyId {
        &self.property.id
    }

    /// Sets the caption. Properties without a caption are hidden.
    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.property.caption = Some(caption.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.property.description = Some(description.into());
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.property.nullable = nullable;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        if self.property.is_derived() && !read_only {
            self.misused("read_only(false)");
        } else {
            self.property.read_only = read_only;
        }
        self
    }

    pub fn default_value(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.default_value_provider(move || value.clone())
    }

    pub fn default_value_provider(mut self, provider: impl Fn() -> Value + 'static) -> Self {
        self.property.default_value = Some(DefaultValue(Rc::new(provider)));
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.property.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.property.max = Some(max);
        self
    }

    pub fn range(self, min: f64, max: f64) -> Self {
        self.min(min).max(max)
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.property.max_length = Some(max_length);
        self
    }

    pub fn maximum_fraction_digits(mut self, digits: u32) -> Self {
        self.property.maximum_fraction_digits = Some(digits);
        self
    }

    /// Sets the chrono format pattern used when rendering the value.
    pub fn format(mut self, pattern: impl Into<String>) -> Self {
        self.property.format = Some(pattern.into());
        self
    }

    pub fn column_name(mut self, column_name: impl Into<String>) -> Self {
        let column_name = column_name.into();
        if let Some(column) = self.column_mut("column_name") {
            column.column_name = column_name;
        }
        self
    }

    /// Makes the column part of the primary key at `index`. Key columns are not
    /// updatable and not nullable.
    pub fn primary_key_index(mut self, index: usize) -> Self {
        if let Some(column) = self.column_mut("primary_key_index") {
            column.primary_key_index = Some(index);
            column.updatable = false;
            self.property.nullable = false;
        }
        self
    }

    /// The database supplies a value for this column on insert.
    pub fn column_has_default(mut self, has_default: bool) -> Self {
        if let Some(column) = self.column_mut("column_has_default") {
            column.has_default = has_default;
        }
        self
    }

    pub fn updatable(mut self, updatable: bool) -> Self {
        if let Some(column) = self.column_mut("updatable") {
            column.updatable = updatable;
        }
        self
    }

    pub fn grouping(mut self, grouping: bool) -> Self {
        if let Some(column) = self.column_mut("grouping") {
            column.grouping = grouping;
        }
        self
    }

    pub fn aggregate(mut self, aggregate: bool) -> Self {
        if let Some(column) = self.column_mut("aggregate") {
            column.aggregate = aggregate;
        }
        self
    }

    pub fn selectable(mut self, selectable: bool) -> Self {
        if let Some(column) = self.column_mut("selectable") {
            column.selectable = selectable;
        }
        self
    }

    pub fn converter(mut self, converter: impl ValueConverter + 'static) -> Self {
        if let Some(column) = self.column_mut("converter") {
            column.converter = Some(Rc::new(converter));
        }
        self
    }

    pub fn fetch_depth(mut self, fetch_depth: usize) -> Self {
        match &mut self.property.kind {
            PropertyKind::ForeignKey(foreign_key) => foreign_key.fetch_depth = Some(fetch_depth),
            _ => self.misused("fetch_depth"),
        }
        self
    }

    pub fn soft_reference(mut self, soft_reference: bool) -> Self {
        match &mut self.property.kind {
            PropertyKind::ForeignKey(foreign_key) => foreign_key.soft_reference = soft_reference,
            _ => self.misused("soft_reference"),
        }
        self
    }

    /// Whether a change to this transient property marks the entity as modified.
    pub fn modifies_entity(mut self, modifies_entity: bool) -> Self {
        match &mut self.property.kind {
            PropertyKind::Transient(transient) => transient.modifies_entity = modifies_entity,
            _ => self.misused("modifies_entity"),
        }
        self
    }

    fn column_mut(&mut self, setter: &str) -> Option<&mut Column> {
        if self.property.as_column().is_none() {
            self.misused(setter);
            return None;
        }
        self.property.as_column_mut()
    }

    fn misused(&mut self, setter: &str) {
        self.misuse.push(format!(
            "`{setter}` does not apply to property `{}`",
            self.property.id
        ));
    }
}

impl From<PropertyBuilder> for ReferenceColumn {
    fn from(builder: PropertyBuilder) -> ReferenceColumn {
        ReferenceColumn::Owned(builder)
    }
}
