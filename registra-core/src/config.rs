use serde::{Deserialize, Serialize};

use crate::error::{RegistraError, Result};

/// Registration rules shared by the validators.
///
/// Every field has a default, so a partial YAML/JSON document is enough.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistrationConfig {
    pub min_identifiers: usize,
    /// Maximum photo size in bytes (inclusive).
    pub max_photo_size: u64,
    pub allowed_photo_types: Vec<String>,
    pub name_min_length: usize,
    pub name_max_length: usize,
    pub max_address_length: usize,
    pub min_birth_year: i32,
    pub max_age: i64,
    /// Known identifier types. Empty means any non-blank type is accepted.
    pub identifier_types: Vec<IdentifierTypeConfig>,
    pub attribute_types: Vec<AttributeTypeConfig>,
    pub required_address_fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierTypeConfig {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeTypeConfig {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub format: AttributeFormat,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttributeFormat {
    #[default]
    Text,
    Email,
    Phone,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            min_identifiers: 1,
            max_photo_size: 5 * 1024 * 1024,
            allowed_photo_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/jpg".to_string(),
            ],
            name_min_length: 2,
            name_max_length: 50,
            max_address_length: 255,
            min_birth_year: 1900,
            max_age: 150,
            identifier_types: Vec::new(),
            attribute_types: Vec::new(),
            required_address_fields: Vec::new(),
        }
    }
}

impl RegistrationConfig {
    /// Reject configurations no form could ever satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.name_min_length > self.name_max_length {
            return Err(RegistraError::Config {
                message: format!(
                    "nameMinLength ({}) is greater than nameMaxLength ({})",
                    self.name_min_length, self.name_max_length
                ),
            });
        }
        if self.max_age < 0 {
            return Err(RegistraError::Config {
                message: format!("maxAge must not be negative (got {})", self.max_age),
            });
        }
        if self.allowed_photo_types.is_empty() {
            return Err(RegistraError::Config {
                message: "allowedPhotoTypes must not be empty".to_string(),
            });
        }
        for field in &self.required_address_fields {
            if !crate::model::ADDRESS_FIELDS.contains(&field.as_str()) {
                return Err(RegistraError::Config {
                    message: format!("Unknown address field in requiredAddressFields: {}", field),
                });
            }
        }
        Ok(())
    }

    pub fn identifier_type(&self, uuid: &str) -> Option<&IdentifierTypeConfig> {
        self.identifier_types.iter().find(|t| t.uuid == uuid)
    }

    pub fn attribute_type(&self, uuid: &str) -> Option<&AttributeTypeConfig> {
        self.attribute_types.iter().find(|t| t.uuid == uuid)
    }

    pub fn is_address_field_required(&self, field: &str) -> bool {
        self.required_address_fields.iter().any(|f| f == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistrationConfig::default();
        assert_eq!(config.min_identifiers, 1);
        assert_eq!(config.max_photo_size, 5_242_880);
        assert_eq!(config.name_max_length, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RegistrationConfig = serde_json::from_str(
            r#"{"minIdentifiers": 2, "identifierTypes": [{"uuid": "id-type-1", "name": "OpenMRS ID"}]}"#,
        )
        .unwrap();
        assert_eq!(config.min_identifiers, 2);
        assert_eq!(config.max_age, 150);
        assert!(config.identifier_type("id-type-1").is_some());
        assert!(!config.identifier_type("id-type-1").unwrap().required);
    }

    #[test]
    fn test_attribute_format_parsing() {
        let config: RegistrationConfig = serde_json::from_str(
            r#"{"attributeTypes": [{"uuid": "attr-email", "name": "Email", "format": "email"}]}"#,
        )
        .unwrap();
        assert_eq!(
            config.attribute_type("attr-email").unwrap().format,
            AttributeFormat::Email
        );
    }

    #[test]
    fn test_inverted_name_bounds_rejected() {
        let config = RegistrationConfig {
            name_min_length: 10,
            name_max_length: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_required_address_field_rejected() {
        let config = RegistrationConfig {
            required_address_fields: vec!["planet".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
