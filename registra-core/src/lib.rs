pub mod backend;
pub mod config;
pub mod error;
pub mod mapper;
pub mod model;
pub mod operation_outcome;
pub mod request;
pub mod validation;
pub mod wizard;

pub use backend::{BackendPatient, PatientSearchResult};
pub use config::{AttributeFormat, AttributeTypeConfig, IdentifierTypeConfig, RegistrationConfig};
pub use error::{RegistraError, Result};
pub use mapper::{
    ConsistencyResult, FieldChange, PatientSummary, compare_patient_data,
    map_form_to_create_request, map_form_to_update_request, map_openmrs_to_form,
    summarize_search_results, validate_data_consistency,
};
pub use model::{FormAddress, FormAttribute, FormIdentifier, Gender, PatientFormData, Photo};
pub use operation_outcome::{IssueSeverity, IssueType, OperationOutcome, OperationOutcomeIssue};
pub use request::{CreatePatientRequest, PatientPayload, UpdatePatientRequest};
pub use validation::{
    FieldValidationResult, FormValidationResult, PatientValidator, ValidationCode,
};
pub use wizard::{WizardState, WizardStep, WizardStepValidation};
