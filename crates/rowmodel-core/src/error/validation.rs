use super::{Error, ErrorKind};

/// Error when a property value fails validation constraints.
#[derive(Debug)]
pub(super) struct ValidationError {
    pub(super) property: Box<str>,
    pub(super) kind: ValidationErrorKind,
}

#[derive(Debug)]
pub(super) enum ValidationErrorKind {
    /// A non-nullable property has no value
    Null,

    /// A numerical value lies outside `[min, max]`
    Range {
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },

    /// A string value exceeds the maximum length
    Length { value_len: usize, max: usize },
}

impl std::error::Error for ValidationError {}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match &self.kind {
            ValidationErrorKind::Null => write!(f, "value required: {}", self.property),
            ValidationErrorKind::Range { value, min, max } => {
                match (min, max) {
                    (Some(min), _) if value < min => write!(
                        f,
                        "{}: value {} is too small (minimum: {})",
                        self.property, value, min
                    ),
                    (_, Some(max)) if value > max => write!(
                        f,
                        "{}: value {} is too large (maximum: {})",
                        self.property, value, max
                    ),
                    _ => write!(f, "{}: range constraint violation", self.property),
                }
            }
            ValidationErrorKind::Length { value_len, max } => write!(
                f,
                "{}: value length {} is too long (maximum: {})",
                self.property, value_len, max
            ),
        }
    }
}

impl Error {
    /// Creates a validation error for a missing value of a non-nullable property.
    pub fn validation_null(property: impl Into<String>) -> Error {
        Error::validation(property.into(), ValidationErrorKind::Null)
    }

    /// Creates a validation error for a value outside the property's range.
    pub fn validation_range(
        property: impl Into<String>,
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Error {
        Error::validation(property.into(), ValidationErrorKind::Range { value, min, max })
    }

    /// Creates a validation error for a string exceeding the property's maximum length.
    pub fn validation_length(property: impl Into<String>, value_len: usize, max: usize) -> Error {
        Error::validation(property.into(), ValidationErrorKind::Length { value_len, max })
    }

    fn validation(property: String, kind: ValidationErrorKind) -> Error {
        Error::from(ErrorKind::Validation(ValidationError {
            property: property.into(),
            kind,
        }))
    }

    /// Returns `true` if this error is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation(_))
    }

    /// Returns `true` if this error is a null validation error.
    pub fn is_validation_null(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Validation(ValidationError {
                kind: ValidationErrorKind::Null,
                ..
            })
        )
    }

    /// Returns `true` if this error is a range validation error.
    pub fn is_validation_range(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Validation(ValidationError {
                kind: ValidationErrorKind::Range { .. },
                ..
            })
        )
    }

    /// Returns `true` if this error is a length validation error.
    pub fn is_validation_length(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Validation(ValidationError {
                kind: ValidationErrorKind::Length { .. },
                ..
            })
        )
    }

    /// Returns the id of the property that failed validation.
    pub fn validation_property(&self) -> Option<&str> {
        match self.kind() {
            ErrorKind::Validation(err) => Some(&err.property),
            _ => None,
        }
    }
}
