mod adhoc;
mod invalid_definition;
mod key_generation;
mod lookup;
mod serialization_failure;
mod type_error;
mod validation;

use adhoc::AdhocError;
use invalid_definition::InvalidDefinition;
use key_generation::KeyGenerationError;
use lookup::LookupError;
use serialization_failure::SerializationFailure;
use std::sync::Arc;
use type_error::TypeError;
use validation::ValidationError;

/// Returns early with an ad-hoc error built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

/// Builds an ad-hoc error from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error that can occur while defining or manipulating entities.
#[derive(Clone)]
pub struct Error {
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

impl Error {
    /// Adds context to this error.
    ///
    /// Context is displayed in reverse order: the most recently added context is shown first,
    /// followed by earlier context, ending with the root cause.
    #[inline(always)]
    pub fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let mut err = consequent;
        if err.inner.is_none() {
            err = Error::from(ErrorKind::Unknown);
        }

        match err.inner.as_mut().and_then(Arc::get_mut) {
            Some(inner) if inner.cause.is_none() => {
                inner.cause = Some(self);
                err
            }
            // The consequent is shared or already chained; wrap it instead of mutating.
            _ => Error {
                inner: Some(Arc::new(ErrorInner {
                    kind: ErrorKind::Adhoc(AdhocError::new(err.to_string())),
                    cause: Some(self),
                })),
            },
        }
    }

    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        core::iter::once(err).chain(core::iter::from_fn(move || {
            err = err.inner.as_ref().and_then(|inner| inner.cause.as_ref())?;
            Some(err)
        }))
    }

    fn kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::Anyhow(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            let Some(ref inner) = self.inner else {
                return f.debug_struct("Error").field("kind", &"None").finish();
            };
            f.debug_struct("Error")
                .field("kind", &inner.kind)
                .field("cause", &inner.cause)
                .finish()
        }
    }
}

#[derive(Debug)]
enum ErrorKind {
    Anyhow(anyhow::Error),
    Adhoc(AdhocError),
    InvalidDefinition(InvalidDefinition),
    Validation(ValidationError),
    Type(TypeError),
    Lookup(LookupError),
    SerializationFailure(SerializationFailure),
    KeyGeneration(KeyGenerationError),
    Unknown,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match self {
            Anyhow(err) => core::fmt::Display::fmt(err, f),
            Adhoc(err) => core::fmt::Display::fmt(err, f),
            InvalidDefinition(err) => core::fmt::Display::fmt(err, f),
            Validation(err) => core::fmt::Display::fmt(err, f),
            Type(err) => core::fmt::Display::fmt(err, f),
            Lookup(err) => core::fmt::Display::fmt(err, f),
            SerializationFailure(err) => core::fmt::Display::fmt(err, f),
            KeyGeneration(err) => core::fmt::Display::fmt(err, f),
            Unknown => f.write_str("unknown rowmodel error"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Some(Arc::new(ErrorInner { kind, cause: None })),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Error {
        Error::from(ErrorKind::Anyhow(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

/// Trait for types that can be converted into an Error.
pub trait IntoError {
    /// Converts this type into an Error.
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    #[inline(always)]
    fn into_error(self) -> Error {
        self
    }
}

impl IntoError for &str {
    fn into_error(self) -> Error {
        Error::from(ErrorKind::Adhoc(AdhocError::new(self)))
    }
}

impl IntoError for String {
    fn into_error(self) -> Error {
        Error::from(ErrorKind::Adhoc(AdhocError::new(self)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_word() {
        assert_eq!(core::mem::size_of::<Error>(), core::mem::size_of::<usize>());
    }

    #[test]
    fn shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }

    #[test]
    fn adhoc_macros() {
        fn frozen(entity: &str) -> Result<(), Error> {
            crate::bail!("entity `{entity}` is frozen");
        }

        assert_eq!(frozen("emp").unwrap_err().to_string(), "entity `emp` is frozen");
        assert_eq!(crate::err!("{} rows", 14).to_string(), "14 rows");
    }

    #[test]
    fn context_chain() {
        let err = Error::unknown_property("emp", "salary")
            .context(Error::invalid_definition("derived property `total` depends on an unknown property"))
            .context("defining domain `scott`");
        assert_eq!(
            err.to_string(),
            "defining domain `scott`: invalid entity definition: derived property `total` \
             depends on an unknown property: property `salary` not found in entity `emp`"
        );
    }

    #[test]
    fn context_from_str() {
        let err = Error::unknown_entity("scott.emp").context("loading employees");
        assert_eq!(
            err.to_string(),
            "loading employees: unknown entity `scott.emp`"
        );
        assert!(!err.is_lookup());
    }

    #[test]
    fn anyhow_bridge() {
        let anyhow_err = anyhow::anyhow!("something failed");
        let our_err: Error = anyhow_err.into();
        assert_eq!(our_err.to_string(), "something failed");
    }

    #[test]
    fn invalid_definition_message() {
        let err = Error::invalid_definition("duplicate property id `name` in entity `emp`");
        assert!(err.is_invalid_definition());
        assert_eq!(
            err.to_string(),
            "invalid entity definition: duplicate property id `name` in entity `emp`"
        );
    }

    #[test]
    fn validation_null_message() {
        let err = Error::validation_null("ename");
        assert!(err.is_validation());
        assert_eq!(err.validation_property(), Some("ename"));
        assert_eq!(err.to_string(), "value required: ename");
    }

    #[test]
    fn validation_range_too_large() {
        let err = Error::validation_range("sal", 150.0, Some(0.0), Some(100.0));
        assert_eq!(err.validation_property(), Some("sal"));
        assert_eq!(err.to_string(), "sal: value 150 is too large (maximum: 100)");
    }

    #[test]
    fn validation_range_too_small() {
        let err = Error::validation_range("sal", -1.5, Some(0.0), None);
        assert_eq!(err.to_string(), "sal: value -1.5 is too small (minimum: 0)");
    }

    #[test]
    fn validation_length_too_long() {
        let err = Error::validation_length("ename", 15, 10);
        assert_eq!(
            err.to_string(),
            "ename: value length 15 is too long (maximum: 10)"
        );
    }

    #[test]
    fn type_mismatch_message() {
        let err = Error::type_mismatch("empno", "I32", "String");
        assert!(err.is_type_error());
        assert_eq!(
            err.to_string(),
            "type mismatch for `empno`: expected I32, got String"
        );
    }

    #[test]
    fn lookup_predicates() {
        assert!(Error::unknown_entity("x").is_lookup());
        assert!(Error::unknown_property("emp", "x").is_lookup());
        assert!(Error::not_a_foreign_key("emp", "ename").is_lookup());
        assert!(Error::unknown_domain("scott").is_lookup());
        assert!(!Error::unknown_domain("scott").is_validation());
    }
}
