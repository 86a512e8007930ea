//! Single-field validators.
//!
//! Each check is total: bad input produces an invalid `FieldValidationResult`,
//! never an error or a panic.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::result::{FieldValidationResult, ValidationCode};
use crate::config::{AttributeFormat, RegistrationConfig};
use crate::mapper::helpers::{parse_iso_date, today};
use crate::model::{FormAttribute, FormIdentifier, PatientFormData, Photo};

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s\-']+$").expect("name pattern compiles"));

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9]\d{0,15}$").expect("phone pattern compiles"));

/// Separators users commonly type inside phone numbers.
const PHONE_SEPARATORS: [char; 5] = [' ', '-', '.', '(', ')'];

/// Validates patient form fields against a `RegistrationConfig`.
///
/// Date rules are evaluated relative to `today`, which defaults to the local
/// date and can be pinned with [`PatientValidator::with_today`].
#[derive(Debug, Clone)]
pub struct PatientValidator {
    config: RegistrationConfig,
    today: NaiveDate,
}

impl Default for PatientValidator {
    fn default() -> Self {
        Self::new(RegistrationConfig::default())
    }
}

impl PatientValidator {
    pub fn new(config: RegistrationConfig) -> Self {
        Self {
            config,
            today: today(),
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn validate_given_name(&self, value: &str) -> FieldValidationResult {
        self.validate_required_name(value)
    }

    pub fn validate_family_name(&self, value: &str) -> FieldValidationResult {
        self.validate_required_name(value)
    }

    /// Optional; when present follows the given/family name rule.
    pub fn validate_middle_name(&self, value: &str) -> FieldValidationResult {
        if value.trim().is_empty() {
            return FieldValidationResult::valid();
        }
        self.validate_name_pattern(value)
    }

    fn validate_required_name(&self, value: &str) -> FieldValidationResult {
        if value.trim().is_empty() {
            return FieldValidationResult::invalid(ValidationCode::RequiredField);
        }
        self.validate_name_pattern(value)
    }

    fn validate_name_pattern(&self, value: &str) -> FieldValidationResult {
        let trimmed = value.trim();
        let len = trimmed.chars().count();
        let (min, max) = (self.config.name_min_length, self.config.name_max_length);
        if len < min || len > max || !NAME_PATTERN.is_match(trimmed) {
            return FieldValidationResult::invalid_with(
                ValidationCode::InvalidName,
                format!(
                    "Name must be {}-{} characters and contain only letters, spaces, hyphens and apostrophes",
                    min, max
                ),
            );
        }
        FieldValidationResult::valid()
    }

    pub fn validate_gender(&self, value: &str) -> FieldValidationResult {
        if value.trim().is_empty() {
            return FieldValidationResult::invalid(ValidationCode::RequiredField);
        }
        match crate::model::Gender::parse(value) {
            Some(_) => FieldValidationResult::valid(),
            None => FieldValidationResult::invalid(ValidationCode::InvalidGender),
        }
    }

    pub fn validate_birthdate(&self, value: &str) -> FieldValidationResult {
        if value.trim().is_empty() {
            return FieldValidationResult::valid();
        }
        let Some(date) = parse_iso_date(value) else {
            return FieldValidationResult::invalid(ValidationCode::InvalidDate);
        };
        if date > self.today {
            return FieldValidationResult::invalid_with(
                ValidationCode::InvalidBirthdate,
                "Birthdate cannot be in the future",
            );
        }
        if date.year() < self.config.min_birth_year {
            return FieldValidationResult::invalid_with(
                ValidationCode::InvalidBirthdate,
                format!("Birthdate cannot be before {}", self.config.min_birth_year),
            );
        }
        FieldValidationResult::valid()
    }

    /// Validate a raw age as typed by the user.
    pub fn validate_age(&self, value: &str) -> FieldValidationResult {
        let value = value.trim();
        if value.is_empty() {
            return FieldValidationResult::valid();
        }
        let Ok(age) = value.parse::<i64>() else {
            return FieldValidationResult::invalid_with(
                ValidationCode::InvalidAge,
                "Age must be a number",
            );
        };
        if !(0..=self.config.max_age).contains(&age) {
            return FieldValidationResult::invalid_with(
                ValidationCode::InvalidAge,
                format!("Age must be between 0 and {}", self.config.max_age),
            );
        }
        FieldValidationResult::valid()
    }

    /// Cross-check birthdate and age.
    ///
    /// At least one must be present. When both are, the age derived from the
    /// birthdate must equal the given age, or be within one year of it when
    /// the birthdate is estimated (which still yields a warning).
    pub fn validate_birthdate_and_age(
        &self,
        birthdate: Option<&str>,
        age: Option<i64>,
        estimated: bool,
    ) -> FieldValidationResult {
        let birthdate = birthdate.map(str::trim).filter(|s| !s.is_empty());
        let (birthdate, age) = match (birthdate, age) {
            (None, None) => {
                return FieldValidationResult::invalid(ValidationCode::BirthdateOrAgeRequired);
            }
            (Some(b), Some(a)) => (b, a),
            _ => return FieldValidationResult::valid(),
        };

        if !(0..=self.config.max_age).contains(&age) {
            return FieldValidationResult::invalid_with(
                ValidationCode::InvalidAge,
                format!("Age must be between 0 and {}", self.config.max_age),
            );
        }
        let Some(birth) = parse_iso_date(birthdate) else {
            return FieldValidationResult::invalid(ValidationCode::InvalidDate);
        };
        let computed = i64::from(self.today.years_since(birth).unwrap_or(0));
        let difference = computed.abs_diff(age);
        let tolerance = if estimated { 1 } else { 0 };

        if difference > tolerance {
            return FieldValidationResult::invalid_with(
                ValidationCode::AgeBirthdateMismatch,
                format!(
                    "Age ({}) does not match birthdate (calculated age {})",
                    age, computed
                ),
            );
        }
        if difference > 0 {
            return FieldValidationResult::warn(
                ValidationCode::AgeBirthdateMismatch,
                format!(
                    "Age ({}) differs from estimated birthdate by {} year",
                    age, difference
                ),
            );
        }
        FieldValidationResult::valid()
    }

    /// Validate one identifier row. `existing` holds identifier values
    /// already taken; matching is on the trimmed value, case-sensitive.
    pub fn validate_identifier(
        &self,
        identifier: &FormIdentifier,
        existing: &[String],
    ) -> FieldValidationResult {
        let value = identifier.identifier.trim();
        if value.is_empty() {
            return FieldValidationResult::invalid(ValidationCode::RequiredField);
        }
        let identifier_type = identifier.identifier_type.trim();
        if identifier_type.is_empty() {
            return FieldValidationResult::invalid(ValidationCode::IdentifierTypeRequired);
        }
        if !self.config.identifier_types.is_empty()
            && self.config.identifier_type(identifier_type).is_none()
        {
            return FieldValidationResult::invalid_with(
                ValidationCode::UnknownIdentifierType,
                format!("Unknown identifier type: {}", identifier_type),
            );
        }
        if existing.iter().any(|e| e.trim() == value) {
            return FieldValidationResult::invalid(ValidationCode::DuplicateIdentifier);
        }
        FieldValidationResult::valid()
    }

    /// List-level identifier rules: minimum count, no duplicate values
    /// (whatever their type) and every required identifier type present.
    pub fn validate_identifiers(&self, identifiers: &[FormIdentifier]) -> FieldValidationResult {
        let filled: Vec<&FormIdentifier> = identifiers
            .iter()
            .filter(|id| !id.identifier.trim().is_empty())
            .collect();

        if filled.len() < self.config.min_identifiers {
            return FieldValidationResult::invalid_with(
                ValidationCode::MinIdentifiers,
                if self.config.min_identifiers == 1 {
                    ValidationCode::MinIdentifiers.message().to_string()
                } else {
                    format!(
                        "At least {} identifiers are required",
                        self.config.min_identifiers
                    )
                },
            );
        }

        let mut seen = HashSet::new();
        for id in &filled {
            let value = id.identifier.trim();
            if !seen.insert(value) {
                return FieldValidationResult::invalid_with(
                    ValidationCode::DuplicateIdentifier,
                    format!("Duplicate identifier: {}", value),
                );
            }
        }

        for required in self.config.identifier_types.iter().filter(|t| t.required) {
            if !filled.iter().any(|id| id.identifier_type == required.uuid) {
                return FieldValidationResult::invalid_with(
                    ValidationCode::IdentifierTypeRequired,
                    format!("Missing required identifier type: {}", required.name),
                );
            }
        }

        FieldValidationResult::valid()
    }

    pub fn validate_email(&self, value: &str) -> FieldValidationResult {
        let value = value.trim();
        if value.is_empty() || EMAIL_PATTERN.is_match(value) {
            FieldValidationResult::valid()
        } else {
            FieldValidationResult::invalid(ValidationCode::InvalidEmail)
        }
    }

    pub fn validate_phone(&self, value: &str) -> FieldValidationResult {
        if value.trim().is_empty() {
            return FieldValidationResult::valid();
        }
        let cleaned: String = value
            .chars()
            .filter(|c| !PHONE_SEPARATORS.contains(c))
            .collect();
        if PHONE_PATTERN.is_match(&cleaned) {
            FieldValidationResult::valid()
        } else {
            FieldValidationResult::invalid(ValidationCode::InvalidPhone)
        }
    }

    pub fn validate_address_field(&self, value: &str, required: bool) -> FieldValidationResult {
        if value.trim().is_empty() {
            return if required {
                FieldValidationResult::invalid(ValidationCode::RequiredField)
            } else {
                FieldValidationResult::valid()
            };
        }
        if value.chars().count() > self.config.max_address_length {
            return FieldValidationResult::invalid_with(
                ValidationCode::FieldTooLong,
                format!(
                    "Must be at most {} characters",
                    self.config.max_address_length
                ),
            );
        }
        FieldValidationResult::valid()
    }

    pub fn validate_photo(&self, photo: Option<&Photo>) -> FieldValidationResult {
        let Some(photo) = photo else {
            return FieldValidationResult::valid();
        };
        let mime = photo.mime_type.trim().to_ascii_lowercase();
        if !self.config.allowed_photo_types.iter().any(|t| *t == mime) {
            return FieldValidationResult::invalid_with(
                ValidationCode::UnsupportedPhotoFormat,
                format!("Unsupported photo format: {}", photo.mime_type),
            );
        }
        if photo.size > self.config.max_photo_size {
            return FieldValidationResult::invalid_with(
                ValidationCode::PhotoTooLarge,
                format!(
                    "Photo must be at most {} bytes",
                    self.config.max_photo_size
                ),
            );
        }
        FieldValidationResult::valid()
    }

    /// Validate a person attribute according to its configured format.
    /// Attribute types missing from the configuration are free text.
    pub fn validate_attribute(&self, attribute: &FormAttribute) -> FieldValidationResult {
        let Some(attribute_type) = self.config.attribute_type(&attribute.attribute_type) else {
            return FieldValidationResult::valid();
        };
        if attribute.value.trim().is_empty() {
            return if attribute_type.required {
                FieldValidationResult::invalid_with(
                    ValidationCode::RequiredField,
                    format!("{} is required", attribute_type.name),
                )
            } else {
                FieldValidationResult::valid()
            };
        }
        match attribute_type.format {
            AttributeFormat::Email => self.validate_email(&attribute.value),
            AttributeFormat::Phone => self.validate_phone(&attribute.value),
            AttributeFormat::Text => FieldValidationResult::valid(),
        }
    }

    /// Validate one field as the user edits it.
    ///
    /// `field` uses form field names (`givenName`, `address.cityVillage`,
    /// `identifier_2`, ...). `form` supplies context such as the estimated
    /// flag or the identifiers already entered. Unknown fields are valid.
    pub fn validate_field_real_time(
        &self,
        field: &str,
        value: &str,
        form: &PatientFormData,
    ) -> FieldValidationResult {
        match field {
            "givenName" => self.validate_given_name(value),
            "middleName" => self.validate_middle_name(value),
            "familyName" => self.validate_family_name(value),
            "gender" => self.validate_gender(value),
            "birthdate" => {
                let result = self.validate_birthdate(value);
                let Some(age) = form.age else {
                    return result;
                };
                // Same rule as the full form: no cross-check against a bad age.
                if !result.is_valid
                    || value.trim().is_empty()
                    || !self.validate_age(&age.to_string()).is_valid
                {
                    return result;
                }
                self.validate_birthdate_and_age(Some(value), Some(age), form.birthdate_estimated)
            }
            "age" => {
                let result = self.validate_age(value);
                let Ok(age) = value.trim().parse::<i64>() else {
                    return result;
                };
                if !result.is_valid || form.birthdate_value().is_none() {
                    return result;
                }
                self.validate_birthdate_and_age(
                    form.birthdate_value(),
                    Some(age),
                    form.birthdate_estimated,
                )
            }
            "email" => self.validate_email(value),
            "phone" => self.validate_phone(value),
            "identifier" => {
                let candidate = FormIdentifier {
                    identifier: value.to_string(),
                    identifier_type: form
                        .identifiers
                        .first()
                        .map(|id| id.identifier_type.clone())
                        .unwrap_or_default(),
                    ..Default::default()
                };
                let existing: Vec<String> =
                    form.identifiers.iter().map(|id| id.identifier.clone()).collect();
                self.validate_value_only(&candidate, &existing)
            }
            _ => {
                if let Some(sub) = field.strip_prefix("address.") {
                    return match form.address.field(sub) {
                        Some(_) => self.validate_address_field(
                            value,
                            self.config.is_address_field_required(sub),
                        ),
                        None => FieldValidationResult::valid(),
                    };
                }
                if let Some(index) = indexed(field, "identifier_") {
                    let Some(row) = form.identifiers.get(index) else {
                        return FieldValidationResult::valid();
                    };
                    let candidate = FormIdentifier {
                        identifier: value.to_string(),
                        ..row.clone()
                    };
                    let existing: Vec<String> = form
                        .identifiers
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| *i != index)
                        .map(|(_, id)| id.identifier.clone())
                        .collect();
                    return self.validate_identifier(&candidate, &existing);
                }
                if let Some(index) = indexed(field, "attribute_") {
                    let Some(row) = form.attributes.get(index) else {
                        return FieldValidationResult::valid();
                    };
                    let candidate = FormAttribute {
                        attribute_type: row.attribute_type.clone(),
                        value: value.to_string(),
                    };
                    return self.validate_attribute(&candidate);
                }
                FieldValidationResult::valid()
            }
        }
    }

    /// Identifier value checks for a row whose type has not been picked yet.
    fn validate_value_only(
        &self,
        identifier: &FormIdentifier,
        existing: &[String],
    ) -> FieldValidationResult {
        if identifier.identifier_type.trim().is_empty() {
            let value = identifier.identifier.trim();
            if value.is_empty() {
                return FieldValidationResult::invalid(ValidationCode::RequiredField);
            }
            if existing.iter().any(|e| e.trim() == value) {
                return FieldValidationResult::invalid(ValidationCode::DuplicateIdentifier);
            }
            return FieldValidationResult::valid();
        }
        self.validate_identifier(identifier, existing)
    }
}

/// Parse `identifier_3` style keys.
fn indexed(field: &str, prefix: &str) -> Option<usize> {
    field.strip_prefix(prefix)?.parse().ok()
}
