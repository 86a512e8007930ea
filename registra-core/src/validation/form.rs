use super::field::PatientValidator;
use super::result::{FormValidationResult, ValidationCode};
use crate::model::PatientFormData;

/// Required slots counted by `completeness`. Birthdate stands for
/// birthdate-or-age.
pub const REQUIRED_FIELDS: [&str; 5] =
    ["givenName", "familyName", "gender", "identifiers", "birthdate"];

impl PatientValidator {
    /// Run every field rule over `form`.
    pub fn validate_patient_form(&self, form: &PatientFormData) -> FormValidationResult {
        let mut result = FormValidationResult::default();

        self.check_demographics(form, &mut result);
        self.check_identifiers(form, &mut result);
        self.check_address(form, &mut result);
        self.check_attributes(form, &mut result);
        result.record("photo", self.validate_photo(form.photo.as_ref()));

        result.missing_required = missing_required(form);
        result.completeness = completeness(form);
        let result = result.finish();

        tracing::debug!(
            "Validated patient form: valid={} errors={} missing={:?} completeness={}",
            result.is_valid,
            result.errors.len(),
            result.missing_required,
            result.completeness
        );
        result
    }

    pub(crate) fn check_demographics(&self, form: &PatientFormData, result: &mut FormValidationResult) {
        result.record("givenName", self.validate_given_name(&form.given_name));
        result.record("middleName", self.validate_middle_name(&form.middle_name));
        result.record("familyName", self.validate_family_name(&form.family_name));
        result.record("gender", self.validate_gender(&form.gender));

        let birthdate = self.validate_birthdate(form.birthdate_value().unwrap_or_default());
        let age = self.validate_age(&form.age.map(|a| a.to_string()).unwrap_or_default());
        let run_cross_check = birthdate.is_valid && age.is_valid;
        result.record("birthdate", birthdate);
        result.record("age", age);

        // Only compare birthdate and age once each is sound on its own.
        if run_cross_check {
            let cross = self.validate_birthdate_and_age(
                form.birthdate_value(),
                form.age,
                form.birthdate_estimated,
            );
            let key = if cross.code == Some(ValidationCode::BirthdateOrAgeRequired) {
                "birthdate"
            } else {
                "age"
            };
            result.record(key, cross);
        }
    }

    pub(crate) fn check_identifiers(&self, form: &PatientFormData, result: &mut FormValidationResult) {
        result.record("identifiers", self.validate_identifiers(&form.identifiers));

        for (idx, identifier) in form.identifiers.iter().enumerate() {
            // untouched rows added by the UI are not errors
            if identifier.identifier.trim().is_empty() && identifier.identifier_type.trim().is_empty() {
                continue;
            }
            result.record(
                format!("identifier_{}", idx),
                self.validate_identifier(identifier, &[]),
            );
        }

        if form.filled_identifiers().next().is_some() && form.preferred_identifier_count() != 1 {
            result.warnings.insert(
                "identifiers".to_string(),
                "Exactly one identifier should be marked as preferred".to_string(),
            );
        }
    }

    fn check_address(&self, form: &PatientFormData, result: &mut FormValidationResult) {
        for (name, value) in form.address.fields() {
            let required = self.config().is_address_field_required(name);
            result.record(
                format!("address.{}", name),
                self.validate_address_field(value, required),
            );
        }
    }

    fn check_attributes(&self, form: &PatientFormData, result: &mut FormValidationResult) {
        for (idx, attribute) in form.attributes.iter().enumerate() {
            result.record(format!("attribute_{}", idx), self.validate_attribute(attribute));
        }
    }
}

/// Required slots with no value, in `REQUIRED_FIELDS` order.
pub fn missing_required(form: &PatientFormData) -> Vec<String> {
    REQUIRED_FIELDS
        .iter()
        .filter(|field| !slot_present(form, field))
        .map(|field| field.to_string())
        .collect()
}

/// Share of required slots that hold a value, as a rounded percentage.
/// Presence only; a filled but invalid field still counts.
pub fn completeness(form: &PatientFormData) -> u8 {
    let present = REQUIRED_FIELDS
        .iter()
        .filter(|field| slot_present(form, field))
        .count();
    let percent = (present as f64 / REQUIRED_FIELDS.len() as f64 * 100.0).round();
    percent as u8
}

fn slot_present(form: &PatientFormData, field: &str) -> bool {
    match field {
        "givenName" => !form.given_name.trim().is_empty(),
        "familyName" => !form.family_name.trim().is_empty(),
        "gender" => !form.gender.trim().is_empty(),
        "identifiers" => form.filled_identifiers().next().is_some(),
        "birthdate" => form.birthdate_value().is_some() || form.age.is_some(),
        _ => false,
    }
}
