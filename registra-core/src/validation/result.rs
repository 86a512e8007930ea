use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Machine-readable reason attached to a failed (or warned) field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    RequiredField,
    InvalidName,
    InvalidGender,
    InvalidDate,
    InvalidBirthdate,
    InvalidAge,
    BirthdateOrAgeRequired,
    AgeBirthdateMismatch,
    IdentifierTypeRequired,
    UnknownIdentifierType,
    DuplicateIdentifier,
    MinIdentifiers,
    InvalidEmail,
    InvalidPhone,
    FieldTooLong,
    PhotoTooLarge,
    UnsupportedPhotoFormat,
}

impl ValidationCode {
    /// Default English message for this code.
    pub fn message(&self) -> &'static str {
        match self {
            ValidationCode::RequiredField => "This field is required",
            ValidationCode::InvalidName => {
                "Name must be 2-50 characters and contain only letters, spaces, hyphens and apostrophes"
            }
            ValidationCode::InvalidGender => "Gender must be one of M, F or O",
            ValidationCode::InvalidDate => "Invalid date format",
            ValidationCode::InvalidBirthdate => {
                "Birthdate cannot be in the future or before 1900"
            }
            ValidationCode::InvalidAge => "Age must be a number between 0 and 150",
            ValidationCode::BirthdateOrAgeRequired => "Either birthdate or age is required",
            ValidationCode::AgeBirthdateMismatch => "Age does not match birthdate",
            ValidationCode::IdentifierTypeRequired => "Identifier type is required",
            ValidationCode::UnknownIdentifierType => "Unknown identifier type",
            ValidationCode::DuplicateIdentifier => "This identifier is already in use",
            ValidationCode::MinIdentifiers => "At least one identifier is required",
            ValidationCode::InvalidEmail => "Invalid email address",
            ValidationCode::InvalidPhone => "Invalid phone number",
            ValidationCode::FieldTooLong => "Value is too long",
            ValidationCode::PhotoTooLarge => "Photo exceeds the maximum allowed size",
            ValidationCode::UnsupportedPhotoFormat => "Photo must be a JPEG or PNG image",
        }
    }
}

/// Outcome of validating one field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldValidationResult {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ValidationCode>,
}

impl FieldValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            ..Default::default()
        }
    }

    pub fn invalid(code: ValidationCode) -> Self {
        Self::invalid_with(code, code.message())
    }

    pub fn invalid_with(code: ValidationCode, error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(error.into()),
            warning: None,
            code: Some(code),
        }
    }

    /// Valid, but worth telling the user about.
    pub fn warn(code: ValidationCode, warning: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            error: None,
            warning: Some(warning.into()),
            code: Some(code),
        }
    }
}

/// Aggregate result over a whole form (or one wizard step of it).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormValidationResult {
    pub is_valid: bool,
    pub errors: BTreeMap<String, String>,
    pub warnings: BTreeMap<String, String>,
    pub missing_required: Vec<String>,
    /// Percentage of required slots filled, 0-100.
    pub completeness: u8,
    /// Code behind each entry in `errors`. Not part of the wire shape.
    #[serde(skip)]
    pub error_codes: BTreeMap<String, ValidationCode>,
}

impl FormValidationResult {
    /// Fold a field result into the error/warning maps under `key`.
    pub(crate) fn record(&mut self, key: impl Into<String>, result: FieldValidationResult) {
        let key = key.into();
        if let Some(error) = result.error {
            if let Some(code) = result.code {
                self.error_codes.insert(key.clone(), code);
            }
            self.errors.insert(key.clone(), error);
        }
        if let Some(warning) = result.warning {
            self.warnings.insert(key, warning);
        }
    }

    pub(crate) fn finish(mut self) -> Self {
        self.is_valid = self.errors.is_empty();
        self
    }
}
