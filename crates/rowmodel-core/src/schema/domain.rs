use super::{
    DefinitionBuilder, EntityDefinition, EntityId, Property, PropertyBuilder, PropertyId,
    PropertyKind, Reference, ReferenceColumn, Settings,
};
use crate::{Entity, Error, Key, Result, Type, Value};
use indexmap::IndexMap;
use std::rc::Rc;
use tracing::{debug, warn};

/// The set of entity definitions sharing a namespace id.
///
/// A domain is built mutably, then shared behind an `Rc` from which entities and keys
/// are created. Entities keep their domain alive.
#[derive(Debug)]
pub struct Domain {
    id: String,

    settings: Settings,

    definitions: IndexMap<EntityId, EntityDefinition>,
}

impl Domain {
    pub fn new(id: impl Into<String>) -> Domain {
        Domain::with_settings(id, Settings::default())
    }

    pub fn with_settings(id: impl Into<String>, settings: Settings) -> Domain {
        Domain {
            id: id.into(),
            settings,
            definitions: IndexMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Defines the entity `id` from `properties`, listed in declaration order.
    ///
    /// Returns a builder to configure the rest of the definition.
    pub fn define<I>(&mut self, id: impl Into<EntityId>, properties: I) -> Result<DefinitionBuilder<'_>>
    where
        I: IntoIterator<Item = PropertyBuilder>,
    {
        let id = id.into();

        if self.definitions.contains_key(&id) {
            if !self.settings.allow_redefine_entity {
                return Err(Error::invalid_definition(format!(
                    "entity `{id}` has already been defined in domain `{}`",
                    self.id
                )));
            }
            warn!(target: "rowmodel::domain", domain = %self.id, entity = %id, "redefining entity");
        }

        let properties = self.collect_properties(&id, properties)?;
        let mut definition = EntityDefinition::new(&self.id, id.clone(), properties);
        definition.index();
        definition.verify(self)?;

        debug!(
            target: "rowmodel::domain",
            domain = %self.id,
            entity = %id,
            properties = definition.properties.len(),
            "entity defined"
        );

        let (index, _) = self.definitions.insert_full(id, definition);
        Ok(DefinitionBuilder {
            definition: &mut self.definitions[index],
        })
    }

    /// Flattens the builders into the property map. Foreign key columns are placed
    /// right after their foreign key.
    fn collect_properties<I>(&self, entity_id: &EntityId, builders: I) -> Result<IndexMap<PropertyId, Property>>
    where
        I: IntoIterator<Item = PropertyBuilder>,
    {
        let mut properties = IndexMap::new();

        for builder in builders {
            let mut property = self.resolve(entity_id, builder.property, builder.misuse)?;
            let mut references = vec![];
            let mut owned = vec![];

            for reference in builder.references {
                match reference {
                    ReferenceColumn::Owned(column) => {
                        let mut column = self.resolve(entity_id, column.property, column.misuse)?;
                        if column.id == property.id {
                            return Err(Error::invalid_definition(format!(
                                "entity `{entity_id}`: foreign key column id must differ from the foreign key id `{}`",
                                property.id
                            )));
                        }

                        let Some(c) = column.as_column_mut() else {
                            return Err(Error::invalid_definition(format!(
                                "entity `{entity_id}`: foreign key `{}` references `{}`, which is not a column",
                                property.id, column.id
                            )));
                        };
                        c.foreign_key = Some(property.id.clone());
                        column.nullable = property.nullable;
                        column.read_only = property.read_only;

                        references.push(Reference {
                            column: column.id.clone(),
                            mirror: false,
                        });
                        owned.push(column);
                    }
                    ReferenceColumn::Mirror(column) => references.push(Reference {
                        column,
                        mirror: true,
                    }),
                }
            }

            if let PropertyKind::ForeignKey(foreign_key) = &mut property.kind {
                foreign_key.references = references;
            }

            for property in std::iter::once(property).chain(owned) {
                let id = property.id.clone();
                if properties.insert(id.clone(), property).is_some() {
                    return Err(Error::invalid_definition(format!(
                        "entity `{entity_id}`: property `{id}` is defined more than once"
                    )));
                }
            }
        }

        Ok(properties)
    }

    /// Surfaces builder misuse and fills in the defaults taken from the settings.
    fn resolve(&self, entity_id: &EntityId, mut property: Property, misuse: Vec<String>) -> Result<Property> {
        if let Some(misuse) = misuse.into_iter().next() {
            return Err(Error::invalid_definition(format!(
                "entity `{entity_id}`: {misuse}"
            )));
        }

        if property.maximum_fraction_digits.is_none() && matches!(property.ty, Type::F64 | Type::Decimal) {
            property.maximum_fraction_digits = Some(self.settings.maximum_fraction_digits);
        }

        if let PropertyKind::ForeignKey(foreign_key) = &mut property.kind {
            foreign_key
                .fetch_depth
                .get_or_insert(self.settings.foreign_key_fetch_depth);
        }

        let id = property.id.to_string();
        if let Some(column) = property.as_column_mut() {
            if column.column_name.is_empty() {
                column.column_name = id;
            }
        }

        Ok(property)
    }

    /// Returns the definition of `entity_id`.
    pub fn definition(&self, entity_id: impl AsRef<str>) -> Result<&EntityDefinition> {
        let entity_id = entity_id.as_ref();
        self.definitions
            .get(entity_id)
            .ok_or_else(|| Error::unknown_entity(entity_id))
    }

    pub fn find_definition(&self, entity_id: &str) -> Option<&EntityDefinition> {
        self.definitions.get(entity_id)
    }

    pub(crate) fn definition_at(&self, index: usize) -> &EntityDefinition {
        &self.definitions[index]
    }

    fn index_of(&self, entity_id: &str) -> Result<usize> {
        self.definitions
            .get_index_of(entity_id)
            .ok_or_else(|| Error::unknown_entity(entity_id))
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.definitions.contains_key(entity_id)
    }

    /// Definitions in the order they were defined.
    pub fn definitions(&self) -> impl ExactSizeIterator<Item = &EntityDefinition> + '_ {
        self.definitions.values()
    }

    /// Returns the property `property` of `entity_id`.
    pub fn property(&self, entity_id: impl AsRef<str>, property: impl AsRef<str>) -> Result<&Property> {
        self.definition(entity_id)?.property(property)
    }

    /// Creates an empty entity of type `entity_id`.
    pub fn entity(self: &Rc<Self>, entity_id: impl AsRef<str>) -> Result<Entity> {
        let index = self.index_of(entity_id.as_ref())?;
        Ok(Entity::new(Rc::clone(self), index))
    }

    /// Creates an entity of type `entity_id` from its values and the original values of
    /// its modified properties.
    pub fn entity_from_values(
        self: &Rc<Self>,
        entity_id: impl AsRef<str>,
        values: IndexMap<PropertyId, Value>,
        originals: IndexMap<PropertyId, Value>,
    ) -> Result<Entity> {
        let index = self.index_of(entity_id.as_ref())?;
        let definition = self.definition_at(index);
        for (id, value) in values.iter().chain(&originals) {
            let property = definition.property(id)?;
            if property.is_derived() {
                return Err(Error::read_only_property(id.as_str()));
            }
            if !value.is_a(property.ty()) {
                return Err(Error::type_mismatch(
                    id.as_str(),
                    property.ty().to_string(),
                    value.type_name(),
                ));
            }
        }
        Ok(Entity::from_parts(Rc::clone(self), index, values, originals))
    }

    /// Creates an empty primary key for `entity_id`.
    pub fn key(self: &Rc<Self>, entity_id: impl AsRef<str>) -> Result<Key> {
        let index = self.index_of(entity_id.as_ref())?;
        Ok(Key::new(Rc::clone(self), index))
    }
}
