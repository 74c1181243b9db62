use super::Error;

/// Error when an entity definition is invalid.
///
/// This occurs when:
/// - An entity has duplicate property ids or primary key indices
/// - An entity has no primary key
/// - A foreign key references an undefined entity, or its column count does not
///   match the referenced primary key
/// - An entity is redefined without redefinition being allowed
/// - A set-once definition attribute is set twice
///
/// These errors are raised while a domain is being set up and are never recoverable.
#[derive(Debug)]
pub(super) struct InvalidDefinition {
    message: Box<str>,
}

impl std::error::Error for InvalidDefinition {}

impl core::fmt::Display for InvalidDefinition {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid entity definition: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid definition error.
    pub fn invalid_definition(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidDefinition(InvalidDefinition {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid definition error.
    pub fn is_invalid_definition(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidDefinition(_))
    }
}
