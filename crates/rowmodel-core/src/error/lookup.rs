use super::{Error, ErrorKind};

/// Error when an id does not resolve to anything known.
///
/// These always indicate a caller bug, typically a mistyped id.
#[derive(Debug)]
pub(super) enum LookupError {
    Domain(Box<str>),
    Entity(Box<str>),
    Property { entity: Box<str>, property: Box<str> },
    NotForeignKey { entity: Box<str>, property: Box<str> },
}

impl std::error::Error for LookupError {}

impl core::fmt::Display for LookupError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            LookupError::Domain(id) => write!(f, "unknown domain `{id}`"),
            LookupError::Entity(id) => write!(f, "unknown entity `{id}`"),
            LookupError::Property { entity, property } => {
                write!(f, "property `{property}` not found in entity `{entity}`")
            }
            LookupError::NotForeignKey { entity, property } => {
                write!(f, "`{entity}.{property}` is not a foreign key property")
            }
        }
    }
}

impl Error {
    pub fn unknown_domain(domain: impl Into<String>) -> Error {
        Error::from(ErrorKind::Lookup(LookupError::Domain(domain.into().into())))
    }

    pub fn unknown_entity(entity: impl Into<String>) -> Error {
        Error::from(ErrorKind::Lookup(LookupError::Entity(entity.into().into())))
    }

    pub fn unknown_property(entity: impl Into<String>, property: impl Into<String>) -> Error {
        Error::from(ErrorKind::Lookup(LookupError::Property {
            entity: entity.into().into(),
            property: property.into().into(),
        }))
    }

    pub fn not_a_foreign_key(entity: impl Into<String>, property: impl Into<String>) -> Error {
        Error::from(ErrorKind::Lookup(LookupError::NotForeignKey {
            entity: entity.into().into(),
            property: property.into().into(),
        }))
    }

    /// Returns `true` if this error is a lookup error.
    pub fn is_lookup(&self) -> bool {
        matches!(self.kind(), ErrorKind::Lookup(_))
    }
}
