use super::{Error, ErrorKind};

/// Error when a value cannot be stored in a property.
#[derive(Debug)]
pub(super) struct TypeError {
    property: Box<str>,
    kind: TypeErrorKind,
}

#[derive(Debug)]
enum TypeErrorKind {
    Mismatch {
        expected: Box<str>,
        actual: Box<str>,
    },
    ValueListItem {
        value: Box<str>,
    },
    ReadOnly,
}

impl std::error::Error for TypeError {}

impl core::fmt::Display for TypeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match &self.kind {
            TypeErrorKind::Mismatch { expected, actual } => write!(
                f,
                "type mismatch for `{}`: expected {}, got {}",
                self.property, expected, actual
            ),
            TypeErrorKind::ValueListItem { value } => write!(
                f,
                "invalid value list item for `{}`: {}",
                self.property, value
            ),
            TypeErrorKind::ReadOnly => {
                write!(f, "cannot set the value of read-only property `{}`", self.property)
            }
        }
    }
}

impl Error {
    /// Creates a type error for a value whose type does not match the property type.
    pub fn type_mismatch(
        property: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Error {
        Error::type_error(
            property.into(),
            TypeErrorKind::Mismatch {
                expected: expected.into().into(),
                actual: actual.into().into(),
            },
        )
    }

    /// Creates a type error for a value that is not part of a value list.
    pub fn invalid_value_list_item(property: impl Into<String>, value: impl Into<String>) -> Error {
        Error::type_error(
            property.into(),
            TypeErrorKind::ValueListItem {
                value: value.into().into(),
            },
        )
    }

    /// Creates a type error for a write to a property that can not be set, such as a
    /// derived property.
    pub fn read_only_property(property: impl Into<String>) -> Error {
        Error::type_error(property.into(), TypeErrorKind::ReadOnly)
    }

    fn type_error(property: String, kind: TypeErrorKind) -> Error {
        Error::from(ErrorKind::Type(TypeError {
            property: property.into(),
            kind,
        }))
    }

    /// Returns `true` if this error is a type error.
    pub fn is_type_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Type(_))
    }

    /// Returns `true` if this error was caused by writing a read-only property.
    pub fn is_read_only_property(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Type(TypeError {
                kind: TypeErrorKind::ReadOnly,
                ..
            })
        )
    }
}
