pub mod driver;
pub use driver::Connection;

mod entity;
pub use entity::{Entity, Key, KeyShape, SourceValues};

mod error;
pub use error::{Error, IntoError};

pub mod schema;
pub use schema::Domain;

pub mod validator;
pub use validator::{DefaultValidator, Validator};

pub mod value;
pub use value::{Type, Value};

mod value_map;
pub use value_map::{ValueChange, ValueMap};

/// A Result type alias that uses rowmodel's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
