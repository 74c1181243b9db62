use crate::Result;
use serde::Deserialize;

/// Domain-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Foreign keys must reference entities that are already defined, with a matching
    /// number of primary key columns.
    pub strict_foreign_keys: bool,

    /// Defining an entity id a second time replaces the earlier definition instead of
    /// failing.
    pub allow_redefine_entity: bool,

    /// Default number of fraction digits kept for double and decimal properties.
    pub maximum_fraction_digits: u32,

    /// Default fetch depth of foreign key properties.
    pub foreign_key_fetch_depth: usize,

    pub date_format: String,

    pub time_format: String,

    pub timestamp_format: String,

    /// Name of the entity serializer to use, if any.
    pub entity_serializer: Option<String>,
}

impl Settings {
    /// Parses settings from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Settings> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            strict_foreign_keys: true,
            allow_redefine_entity: false,
            maximum_fraction_digits: 10,
            foreign_key_fetch_depth: 1,
            date_format: "%d-%m-%Y".to_string(),
            time_format: "%H:%M".to_string(),
            timestamp_format: "%d-%m-%Y %H:%M".to_string(),
            entity_serializer: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings =
            Settings::from_json(r#"{ "strict_foreign_keys": false, "entity_serializer": "binary" }"#)
                .unwrap();
        assert!(!settings.strict_foreign_keys);
        assert_eq!(settings.entity_serializer.as_deref(), Some("binary"));
        assert_eq!(settings.maximum_fraction_digits, 10);
        assert_eq!(settings.date_format, "%d-%m-%Y");
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Settings::from_json("{ strict").is_err());
    }
}
