use super::{
    provider::format_with, ColorProvider, Comparator, ConditionProvider, DisplayProvider, EntityId,
    KeyGenerator, KeyGeneratorKind, NoKeyGenerator, OrderBy, Property, PropertyId, PropertyKind,
    StringProvider,
};
use crate::{DefaultValidator, Entity, Error, Result, Validator};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Describes one entity type: its properties, primary key and the strategies used to
/// generate keys, validate, display and order its entities.
pub struct EntityDefinition {
    pub(crate) domain_id: String,

    pub(crate) id: EntityId,

    pub(crate) caption: String,

    pub(crate) table_name: String,

    pub(crate) select_table_name: Option<String>,

    /// Properties in declaration order. Foreign key columns follow their foreign key.
    pub(crate) properties: IndexMap<PropertyId, Property>,

    /// Indices into `properties`, ordered by primary key index
    pub(crate) primary_key: Vec<usize>,

    pub(crate) columns: Vec<usize>,

    pub(crate) foreign_keys: Vec<usize>,

    /// Transient and derived properties
    pub(crate) transients: Vec<usize>,

    pub(crate) visible: Vec<usize>,

    /// Source property id to the derived properties depending on it
    pub(crate) derived: HashMap<PropertyId, Vec<PropertyId>>,

    /// Foreign key id to the properties denormalized through it
    pub(crate) denormalized: HashMap<PropertyId, Vec<PropertyId>>,

    pub(crate) select_columns: String,

    pub(crate) group_by: Option<String>,

    pub(crate) having: Option<String>,

    pub(crate) order_by: Option<OrderBy>,

    pub(crate) select_query: Option<SelectQuery>,

    pub(crate) search_properties: Vec<PropertyId>,

    pub(crate) key_generator: Rc<dyn KeyGenerator>,

    pub(crate) validator: Rc<dyn Validator>,

    pub(crate) display: Option<Rc<dyn DisplayProvider>>,

    pub(crate) color: Option<Rc<dyn ColorProvider>>,

    pub(crate) comparator: Option<Comparator>,

    pub(crate) condition_providers: IndexMap<String, ConditionProvider>,

    pub(crate) read_only: bool,

    pub(crate) small_dataset: bool,

    pub(crate) static_data: bool,
}

/// A custom query used to select entities instead of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    pub query: String,

    /// The query already contains a `where` clause
    pub contains_where: bool,
}

impl EntityDefinition {
    pub(crate) fn new(domain_id: &str, id: EntityId, properties: IndexMap<PropertyId, Property>) -> Self {
        EntityDefinition {
            domain_id: domain_id.to_string(),
            caption: id.to_string(),
            table_name: id.to_string(),
            id,
            select_table_name: None,
            properties,
            primary_key: vec![],
            columns: vec![],
            foreign_keys: vec![],
            transients: vec![],
            visible: vec![],
            derived: HashMap::new(),
            denormalized: HashMap::new(),
            select_columns: String::new(),
            group_by: None,
            having: None,
            order_by: None,
            select_query: None,
            search_properties: vec![],
            key_generator: Rc::new(NoKeyGenerator),
            validator: Rc::new(DefaultValidator::new()),
            display: None,
            color: None,
            comparator: None,
            condition_providers: IndexMap::new(),
            read_only: false,
            small_dataset: false,
            static_data: false,
        }
    }

    /// Computes the property subsets, dependency maps and select text. Called once the
    /// property map is final.
    pub(crate) fn index(&mut self) {
        let mut primary_key = vec![];
        let mut select_columns = vec![];
        let mut group_by = vec![];

        for (index, property) in self.properties.values_mut().enumerate() {
            match &property.kind {
                PropertyKind::ForeignKey(_) => self.foreign_keys.push(index),
                PropertyKind::Transient(_) => self.transients.push(index),
                PropertyKind::Derived(derived) => {
                    self.transients.push(index);
                    for source in &derived.sources {
                        self.derived
                            .entry(source.clone())
                            .or_default()
                            .push(property.id.clone());
                    }
                }
                PropertyKind::Denormalized(_, denormalized) => {
                    self.denormalized
                        .entry(denormalized.foreign_key.clone())
                        .or_default()
                        .push(property.id.clone());
                }
                _ => {}
            }

            if property.caption.is_some() {
                self.visible.push(index);
            }

            let subquery = property.as_subquery().map(|subquery| subquery.query.clone());
            let id = property.id.clone();
            let Some(column) = property.as_column_mut() else {
                continue;
            };

            self.columns.push(index);
            if let Some(key_index) = column.primary_key_index {
                primary_key.push((key_index, index));
            }
            if column.grouping {
                group_by.push(column.column_name.clone());
            }
            if column.selectable {
                select_columns.push(match subquery {
                    Some(query) => format!("({query}) as {id}"),
                    None => column.column_name.clone(),
                });
                column.select_index = select_columns.len();
            }
        }

        primary_key.sort_by_key(|(key_index, _)| *key_index);
        self.primary_key = primary_key.into_iter().map(|(_, index)| index).collect();
        self.select_columns = select_columns.join(", ");
        if !group_by.is_empty() {
            self.group_by = Some(group_by.join(", "));
        }
    }

    pub fn domain_id(&self) -> &str {
        &self.domain_id
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The table or view to select from, the table itself unless specified.
    pub fn select_table_name(&self) -> &str {
        self.select_table_name.as_deref().unwrap_or(&self.table_name)
    }

    /// Returns the property with the given id.
    pub fn property(&self, id: impl AsRef<str>) -> Result<&Property> {
        let id = id.as_ref();
        self.properties
            .get(id)
            .ok_or_else(|| Error::unknown_property(self.id.as_str(), id))
    }

    pub fn find_property(&self, id: &str) -> Option<&Property> {
        self.properties.get(id)
    }

    pub fn contains_property(&self, id: &str) -> bool {
        self.properties.contains_key(id)
    }

    /// Returns the foreign key property with the given id.
    pub fn foreign_key_property(&self, id: impl AsRef<str>) -> Result<&Property> {
        let property = self.property(id.as_ref())?;
        if !property.is_foreign_key() {
            return Err(Error::not_a_foreign_key(self.id.as_str(), id.as_ref()));
        }
        Ok(property)
    }

    /// All properties in declaration order.
    pub fn properties(&self) -> impl ExactSizeIterator<Item = &Property> + '_ {
        self.properties.values()
    }

    /// Primary key properties ordered by their key index.
    pub fn primary_key_properties(&self) -> impl ExactSizeIterator<Item = &Property> + '_ {
        self.subset(&self.primary_key)
    }

    pub fn column_properties(&self) -> impl ExactSizeIterator<Item = &Property> + '_ {
        self.subset(&self.columns)
    }

    pub fn foreign_key_properties(&self) -> impl ExactSizeIterator<Item = &Property> + '_ {
        self.subset(&self.foreign_keys)
    }

    /// Transient properties, derived ones included.
    pub fn transient_properties(&self) -> impl ExactSizeIterator<Item = &Property> + '_ {
        self.subset(&self.transients)
    }

    /// Properties with a caption.
    pub fn visible_properties(&self) -> impl ExactSizeIterator<Item = &Property> + '_ {
        self.subset(&self.visible)
    }

    fn subset<'a>(&'a self, indices: &'a [usize]) -> impl ExactSizeIterator<Item = &'a Property> + 'a {
        indices.iter().map(|index| &self.properties[*index])
    }

    /// Foreign keys referencing `entity_id`.
    pub fn foreign_keys_referencing<'a>(
        &'a self,
        entity_id: &'a str,
    ) -> impl Iterator<Item = &'a Property> + 'a {
        self.foreign_key_properties().filter(move |property| {
            property
                .as_foreign_key()
                .map(|foreign_key| foreign_key.foreign_entity.as_str() == entity_id)
                .unwrap_or(false)
        })
    }

    pub fn has_derived_properties(&self) -> bool {
        !self.derived.is_empty()
    }

    /// Derived properties depending on `source`.
    pub fn derived_properties(&self, source: &str) -> &[PropertyId] {
        self.derived.get(source).map(|ids| &ids[..]).unwrap_or(&[])
    }

    pub fn has_denormalized_properties(&self) -> bool {
        !self.denormalized.is_empty()
    }

    /// Properties denormalized through `foreign_key`.
    pub fn denormalized_properties(&self, foreign_key: &str) -> &[PropertyId] {
        self.denormalized
            .get(foreign_key)
            .map(|ids| &ids[..])
            .unwrap_or(&[])
    }

    /// Selectable columns joined with `", "`, in select index order.
    pub fn select_columns(&self) -> &str {
        &self.select_columns
    }

    pub fn group_by_clause(&self) -> Option<&str> {
        self.group_by.as_deref()
    }

    pub fn having_clause(&self) -> Option<&str> {
        self.having.as_deref()
    }

    pub fn order_by(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }

    pub fn select_query(&self) -> Option<&SelectQuery> {
        self.select_query.as_ref()
    }

    pub fn search_properties(&self) -> &[PropertyId] {
        &self.search_properties
    }

    pub fn key_generator(&self) -> &dyn KeyGenerator {
        &*self.key_generator
    }

    pub fn key_generator_kind(&self) -> KeyGeneratorKind {
        self.key_generator.kind()
    }

    pub fn validator(&self) -> &dyn Validator {
        &*self.validator
    }

    pub fn condition_provider(&self, id: &str) -> Result<&ConditionProvider> {
        self.condition_providers.get(id).ok_or_else(|| {
            Error::invalid_definition(format!(
                "condition provider `{id}` not found in entity `{}`",
                self.id
            ))
        })
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_small_dataset(&self) -> bool {
        self.small_dataset
    }

    pub fn is_static_data(&self) -> bool {
        self.static_data
    }

    /// Renders the display string of `entity`, `"entity_id: key"` unless a provider is
    /// installed.
    pub fn display(&self, entity: &Entity) -> String {
        match &self.display {
            Some(display) => display.display(entity),
            None => format!("{}: {}", self.id, entity.key()),
        }
    }

    pub fn background_color(&self, entity: &Entity, property: &Property) -> Option<String> {
        self.color
            .as_ref()
            .and_then(|color| color.background_color(entity, property))
    }

    /// Orders two entities, by display string unless a comparator is installed.
    pub fn compare(&self, a: &Entity, b: &Entity) -> Ordering {
        match &self.comparator {
            Some(comparator) => comparator(a, b),
            None => a.to_string().cmp(&b.to_string()),
        }
    }

    /// Renders `value` the way `property` is presented. Value list values show their
    /// caption; temporal values use the property format or the domain default.
    pub(crate) fn format_value(&self, property: &Property, value: &crate::Value, default_pattern: &str) -> String {
        if let Some(caption) = property
            .as_value_list()
            .and_then(|value_list| value_list.caption(value))
        {
            return caption.to_string();
        }

        format_with(value, property.format().unwrap_or(default_pattern))
    }
}

impl fmt::Debug for EntityDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDefinition")
            .field("domain_id", &self.domain_id)
            .field("id", &self.id)
            .field("table_name", &self.table_name)
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .field("key_generator", &self.key_generator)
            .finish()
    }
}

/// Configures an entity definition right after it has been defined.
pub struct DefinitionBuilder<'a> {
    pub(crate) definition: &'a mut EntityDefinition,
}

impl fmt::Debug for DefinitionBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DefinitionBuilder")
            .field(&self.definition.id())
            .finish()
    }
}

impl DefinitionBuilder<'_> {
    pub fn definition(&self) -> &EntityDefinition {
        &*self.definition
    }

    pub fn caption(&mut self, caption: impl Into<String>) -> &mut Self {
        self.definition.caption = caption.into();
        self
    }

    pub fn table_name(&mut self, table_name: impl Into<String>) -> &mut Self {
        self.definition.table_name = table_name.into();
        self
    }

    pub fn select_table_name(&mut self, select_table_name: impl Into<String>) -> &mut Self {
        self.definition.select_table_name = Some(select_table_name.into());
        self
    }

    pub fn select_query(&mut self, query: impl Into<String>, contains_where: bool) -> &mut Self {
        self.definition.select_query = Some(SelectQuery {
            query: query.into(),
            contains_where,
        });
        self
    }

    pub fn read_only(&mut self, read_only: bool) -> &mut Self {
        self.definition.read_only = read_only;
        self
    }

    pub fn small_dataset(&mut self, small_dataset: bool) -> &mut Self {
        self.definition.small_dataset = small_dataset;
        self
    }

    pub fn static_data(&mut self, static_data: bool) -> &mut Self {
        self.definition.static_data = static_data;
        self
    }

    pub fn key_generator(&mut self, key_generator: impl KeyGenerator + 'static) -> &mut Self {
        self.definition.key_generator = Rc::new(key_generator);
        self
    }

    pub fn validator(&mut self, validator: impl Validator + 'static) -> &mut Self {
        self.definition.validator = Rc::new(validator);
        self
    }

    /// Installs a [`StringProvider`], checking the properties it refers to.
    pub fn string_provider(&mut self, provider: StringProvider) -> Result<&mut Self> {
        provider.verify(&*self.definition)?;
        self.definition.display = Some(Rc::new(provider));
        Ok(self)
    }

    pub fn display_provider(&mut self, provider: impl DisplayProvider + 'static) -> &mut Self {
        self.definition.display = Some(Rc::new(provider));
        self
    }

    pub fn color_provider(&mut self, provider: impl ColorProvider + 'static) -> &mut Self {
        self.definition.color = Some(Rc::new(provider));
        self
    }

    pub fn comparator(&mut self, comparator: impl Fn(&Entity, &Entity) -> Ordering + 'static) -> &mut Self {
        self.definition.comparator = Some(Rc::new(comparator));
        self
    }

    /// Sets the default ordering. Can only be set once.
    pub fn order_by(&mut self, order_by: OrderBy) -> Result<&mut Self> {
        if let Some(existing) = &self.definition.order_by {
            return Err(Error::invalid_definition(format!(
                "order by has already been set for entity `{}`: {existing:?}",
                self.definition.id
            )));
        }
        for property in order_by.properties() {
            self.definition.property(&property.property)?;
        }
        self.definition.order_by = Some(order_by);
        Ok(self)
    }

    /// Sets the group by clause. Can only be set once, and not at all when grouping
    /// columns are declared.
    pub fn group_by(&mut self, clause: impl Into<String>) -> Result<&mut Self> {
        if let Some(existing) = &self.definition.group_by {
            return Err(Error::invalid_definition(format!(
                "group by clause has already been set for entity `{}`: {existing}",
                self.definition.id
            )));
        }
        self.definition.group_by = Some(clause.into());
        Ok(self)
    }

    /// Sets the having clause. Can only be set once.
    pub fn having(&mut self, clause: impl Into<String>) -> Result<&mut Self> {
        if let Some(existing) = &self.definition.having {
            return Err(Error::invalid_definition(format!(
                "having clause has already been set for entity `{}`: {existing}",
                self.definition.id
            )));
        }
        self.definition.having = Some(clause.into());
        Ok(self)
    }

    /// Sets the properties searched by default. Each must be a string property.
    pub fn search_properties<I>(&mut self, properties: I) -> Result<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<PropertyId>,
    {
        let mut search_properties = vec![];
        for id in properties {
            let id = id.into();
            let property = self.definition.property(&id)?;
            if !property.is_string() {
                return Err(Error::invalid_definition(format!(
                    "search property `{id}` of entity `{}` must be a string property",
                    self.definition.id
                )));
            }
            search_properties.push(id);
        }
        self.definition.search_properties = search_properties;
        Ok(self)
    }

    pub fn condition_provider(
        &mut self,
        id: impl Into<String>,
        provider: impl Fn(&[crate::Value]) -> String + 'static,
    ) -> Result<&mut Self> {
        let id = id.into();
        if self.definition.condition_providers.contains_key(&id) {
            return Err(Error::invalid_definition(format!(
                "condition provider `{id}` has already been added to entity `{}`",
                self.definition.id
            )));
        }
        self.definition
            .condition_providers
            .insert(id, Rc::new(provider));
        Ok(self)
    }
}
