use super::field::PatientValidator;
use super::form::{completeness, missing_required};
use super::result::FormValidationResult;
use crate::model::PatientFormData;
use crate::wizard::WizardStep;

const DEMOGRAPHIC_FIELDS: [&str; 4] = ["givenName", "familyName", "gender", "birthdate"];

impl PatientValidator {
    /// Validate only what the given wizard step is responsible for.
    ///
    /// Address, attributes and photo are optional and always pass; the
    /// summary step runs the full form validation as the last gate before
    /// submission.
    pub fn validate_form_step(&self, form: &PatientFormData, step: WizardStep) -> FormValidationResult {
        let result = match step {
            WizardStep::Demographics => {
                let mut result = FormValidationResult::default();
                self.check_demographics(form, &mut result);
                result.missing_required = missing_required(form)
                    .into_iter()
                    .filter(|f| DEMOGRAPHIC_FIELDS.contains(&f.as_str()))
                    .collect();
                result.completeness = binary_completeness(&result.missing_required);
                result.finish()
            }
            WizardStep::Identifiers => {
                let mut result = FormValidationResult::default();
                self.check_identifiers(form, &mut result);
                result.missing_required = missing_required(form)
                    .into_iter()
                    .filter(|f| f == "identifiers")
                    .collect();
                result.completeness = binary_completeness(&result.missing_required);
                result.finish()
            }
            WizardStep::Address | WizardStep::Attributes | WizardStep::Photo => {
                FormValidationResult {
                    completeness: completeness(form),
                    ..Default::default()
                }
                .finish()
            }
            WizardStep::Summary => self.validate_patient_form(form),
        };

        tracing::debug!(
            "Validated wizard step {}: valid={} errors={}",
            step,
            result.is_valid,
            result.errors.len()
        );
        result
    }
}

fn binary_completeness(missing: &[String]) -> u8 {
    if missing.is_empty() { 100 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FormIdentifier;
    use chrono::NaiveDate;

    fn validator() -> PatientValidator {
        PatientValidator::default().with_today(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    fn demographics_only() -> PatientFormData {
        PatientFormData {
            given_name: "Jane".to_string(),
            family_name: "Doe".to_string(),
            gender: "F".to_string(),
            age: Some(40),
            ..Default::default()
        }
    }

    #[test]
    fn test_demographics_step_ignores_identifiers() {
        let result = validator().validate_form_step(&demographics_only(), WizardStep::Demographics);
        assert!(result.is_valid, "{:?}", result.errors);
        assert!(result.missing_required.is_empty());
        assert_eq!(result.completeness, 100);
    }

    #[test]
    fn test_demographics_step_binary_completeness() {
        let mut form = demographics_only();
        form.gender.clear();
        let result = validator().validate_form_step(&form, WizardStep::Demographics);
        assert!(!result.is_valid);
        assert_eq!(result.missing_required, vec!["gender".to_string()]);
        assert_eq!(result.completeness, 0);
    }

    #[test]
    fn test_identifiers_step() {
        let mut form = demographics_only();
        let result = validator().validate_form_step(&form, WizardStep::Identifiers);
        assert!(!result.is_valid);
        assert_eq!(result.missing_required, vec!["identifiers".to_string()]);
        assert!(!result.errors.contains_key("givenName"));

        form.identifiers.push(FormIdentifier {
            identifier: "100".to_string(),
            identifier_type: "A".to_string(),
            preferred: true,
            ..Default::default()
        });
        let result = validator().validate_form_step(&form, WizardStep::Identifiers);
        assert!(result.is_valid);
        assert_eq!(result.completeness, 100);
    }

    #[test]
    fn test_optional_steps_always_valid() {
        let mut form = PatientFormData::default();
        form.address.country = "x".repeat(400);
        for step in [WizardStep::Address, WizardStep::Attributes, WizardStep::Photo] {
            let result = validator().validate_form_step(&form, step);
            assert!(result.is_valid);
            assert_eq!(result.completeness, 0);
        }
        let result = validator().validate_form_step(&demographics_only(), WizardStep::Photo);
        assert_eq!(result.completeness, 80);
    }

    #[test]
    fn test_summary_matches_full_validation() {
        let v = validator();
        let form = demographics_only();
        assert_eq!(
            v.validate_form_step(&form, WizardStep::Summary),
            v.validate_patient_form(&form)
        );
    }
}
