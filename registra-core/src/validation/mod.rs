//! Validation for patient registration forms
//!
//! field: single-field rules (names, dates, identifiers, contact, photo)
//! form:  composite validation with missing-required and completeness
//! step:  per-wizard-step subsets of the composite

pub mod field;
pub mod form;
pub mod result;
pub mod step;

pub use field::PatientValidator;
pub use form::{REQUIRED_FIELDS, completeness, missing_required};
pub use result::{FieldValidationResult, FormValidationResult, ValidationCode};

use crate::model::PatientFormData;

/// Validate a whole form with the default rules.
pub fn validate_patient_form(form: &PatientFormData) -> FormValidationResult {
    PatientValidator::default().validate_patient_form(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FormIdentifier;

    #[test]
    fn test_validate_with_defaults() {
        let form = PatientFormData {
            given_name: "Ama".to_string(),
            family_name: "Mensah".to_string(),
            gender: "F".to_string(),
            age: Some(30),
            identifiers: vec![FormIdentifier {
                identifier: "GH-1".to_string(),
                identifier_type: "national-id".to_string(),
                preferred: true,
                ..Default::default()
            }],
            ..Default::default()
        };
        let result = validate_patient_form(&form);
        assert!(result.is_valid, "{:?}", result.errors);
        assert_eq!(result.completeness, 100);
    }

    #[test]
    fn test_missing_gender_invalid() {
        let form = PatientFormData {
            given_name: "Ama".to_string(),
            family_name: "Mensah".to_string(),
            age: Some(30),
            ..Default::default()
        };
        let result = validate_patient_form(&form);
        assert!(!result.is_valid);
        assert!(result.errors.contains_key("gender"));
    }
}
