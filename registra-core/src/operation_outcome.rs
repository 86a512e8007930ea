use serde::{Deserialize, Serialize};

use crate::validation::{FormValidationResult, ValidationCode};

/// FHIR OperationOutcome resource for error reporting
/// See: https://www.hl7.org/fhir/operationoutcome.html
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub issue: Vec<OperationOutcomeIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcomeIssue {
    pub severity: IssueSeverity,
    pub code: IssueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
    Information,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    Invalid,
    Required,
    Value,
    Duplicate,
    Informational,
}

impl OperationOutcome {
    /// Create a new OperationOutcome with a single issue
    pub fn new(severity: IssueSeverity, code: IssueType, diagnostics: impl Into<String>) -> Self {
        Self {
            resource_type: "OperationOutcome".to_string(),
            id: None,
            issue: vec![OperationOutcomeIssue {
                severity,
                code,
                diagnostics: Some(diagnostics.into()),
                expression: None,
            }],
        }
    }

    /// Create a success OperationOutcome (validation passed)
    pub fn success() -> Self {
        Self::new(IssueSeverity::Information, IssueType::Informational, "All OK")
    }

    /// Create an error OperationOutcome
    pub fn error(code: IssueType, diagnostics: impl Into<String>) -> Self {
        Self::new(IssueSeverity::Error, code, diagnostics)
    }

    /// Render a form validation result the way the backend reports errors.
    ///
    /// Errors on missing required fields become `required` issues,
    /// duplicate identifiers `duplicate`, other errors `value` issues;
    /// warnings stay warnings. A clean result is a single informational
    /// issue.
    pub fn from_validation(result: &FormValidationResult) -> Self {
        let mut issue = Vec::new();

        for (field, message) in &result.errors {
            let code = match result.error_codes.get(field) {
                Some(ValidationCode::DuplicateIdentifier) => IssueType::Duplicate,
                Some(
                    ValidationCode::RequiredField
                    | ValidationCode::MinIdentifiers
                    | ValidationCode::BirthdateOrAgeRequired,
                ) => IssueType::Required,
                _ if result.missing_required.iter().any(|m| m == field) => IssueType::Required,
                _ => IssueType::Value,
            };
            issue.push(OperationOutcomeIssue {
                severity: IssueSeverity::Error,
                code,
                diagnostics: Some(message.clone()),
                expression: Some(vec![fhir_path(field)]),
            });
        }

        for (field, message) in &result.warnings {
            issue.push(OperationOutcomeIssue {
                severity: IssueSeverity::Warning,
                code: IssueType::Value,
                diagnostics: Some(message.clone()),
                expression: Some(vec![fhir_path(field)]),
            });
        }

        if issue.is_empty() {
            return Self::success();
        }

        Self {
            resource_type: "OperationOutcome".to_string(),
            id: None,
            issue,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.issue.iter().any(|i| i.severity == IssueSeverity::Error)
    }

    /// Add an issue to this OperationOutcome
    pub fn add_issue(&mut self, issue: OperationOutcomeIssue) {
        self.issue.push(issue);
    }
}

impl From<&FormValidationResult> for OperationOutcome {
    fn from(result: &FormValidationResult) -> Self {
        Self::from_validation(result)
    }
}

/// FHIR Patient path for a form field key.
fn fhir_path(field: &str) -> String {
    if let Some(sub) = field.strip_prefix("address.") {
        let element = match sub {
            "address1" | "address2" => "line",
            "cityVillage" => "city",
            "stateProvince" => "state",
            "postalCode" => "postalCode",
            "countyDistrict" => "district",
            other => other,
        };
        return format!("Patient.address[0].{}", element);
    }
    if let Some(idx) = field.strip_prefix("identifier_") {
        return format!("Patient.identifier[{}]", idx);
    }
    if let Some(idx) = field.strip_prefix("attribute_") {
        return format!("Patient.extension[{}]", idx);
    }
    match field {
        "givenName" | "middleName" => "Patient.name[0].given".to_string(),
        "familyName" => "Patient.name[0].family".to_string(),
        "birthdate" | "age" => "Patient.birthDate".to_string(),
        "identifiers" => "Patient.identifier".to_string(),
        other => format!("Patient.{}", other),
    }
}
