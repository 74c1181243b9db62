mod converter;
pub use converter::{BooleanConverter, ValueConverter};

mod definition;
pub use definition::{DefinitionBuilder, EntityDefinition, SelectQuery};

mod domain;
pub use domain::Domain;

mod id;
pub use id::{EntityId, PropertyId};

pub mod key_generator;
pub use key_generator::{
    AutomaticKeyGenerator, IncrementKeyGenerator, KeyGenerator, KeyGeneratorKind,
    NoKeyGenerator, QueriedKeyGenerator, SequenceKeyGenerator,
};

mod order_by;
pub use order_by::{OrderBy, OrderByProperty};

pub mod property;
pub use property::{
    Audit, AuditAction, AuditKind, Column, Denormalized, Derived, ForeignKey, Item, Property,
    PropertyBuilder, PropertyKind, Reference, ReferenceColumn, Subquery, Transient, ValueList,
};

mod provider;
pub use provider::{ColorProvider, Comparator, ConditionProvider, DisplayProvider, StringProvider};

mod settings;
pub use settings::Settings;

mod verify;
