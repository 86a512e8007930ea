//! Command implementations. Each returns the JSON printed on stdout.

use registra_core::{
    BackendPatient, IssueSeverity, IssueType, OperationOutcome, OperationOutcomeIssue,
    PatientFormData, PatientSearchResult, PatientValidator, WizardStep, compare_patient_data,
    map_form_to_create_request, map_form_to_update_request, map_openmrs_to_form,
    mapper::sanitize_form_data, summarize_search_results, validate_data_consistency,
};
use registra_store::{DraftKey, DraftStore};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::path::Path;

use crate::cli::{Commands, DraftCommand};
use crate::config::CliConfig;

pub type CommandResult = Result<Value, Box<dyn std::error::Error>>;

/// Dispatch a parsed command.
pub fn run(command: Commands, config: &CliConfig) -> CommandResult {
    let validator = PatientValidator::new(config.registration.clone());

    match command {
        Commands::Validate {
            form,
            step,
            outcome,
        } => validate(&validator, &read_form(&form)?, step, outcome),
        Commands::Field { name, value, form } => {
            let form = match form {
                Some(path) => read_form(&path)?,
                None => PatientFormData::default(),
            };
            field(&validator, &name, &value, &form)
        }
        Commands::Load { patient } => load(&read_json(&patient)?),
        Commands::CreateRequest { form } => create_request(&read_form(&form)?),
        Commands::UpdateRequest { form, patient } => {
            update_request(&read_form(&form)?, &read_json(&patient)?)
        }
        Commands::Diff { original, updated } => {
            diff(&read_form(&original)?, &read_form(&updated)?)
        }
        Commands::SearchSummary { results } => search_summary(&read_json(&results)?),
        Commands::Draft { action } => {
            std::fs::create_dir_all(&config.storage.data_dir)?;
            let store = DraftStore::open(config.drafts_db_path())?;
            tracing::info!("Opened draft store at {}", config.drafts_db_path().display());
            draft(&store, action)
        }
    }
}

pub fn read_form(path: &Path) -> Result<PatientFormData, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(PatientFormData::from_json(&content)?)
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn validate(
    validator: &PatientValidator,
    form: &PatientFormData,
    step: Option<WizardStep>,
    outcome: bool,
) -> CommandResult {
    let result = match step {
        Some(step) => validator.validate_form_step(form, step),
        None => validator.validate_patient_form(form),
    };

    if outcome {
        Ok(serde_json::to_value(OperationOutcome::from(&result))?)
    } else {
        Ok(serde_json::to_value(&result)?)
    }
}

pub fn field(
    validator: &PatientValidator,
    name: &str,
    value: &str,
    form: &PatientFormData,
) -> CommandResult {
    let result = validator.validate_field_real_time(name, value, form);
    Ok(serde_json::to_value(&result)?)
}

/// Mapped form plus the consistency check; failures also come back as an
/// OperationOutcome.
pub fn load(patient: &BackendPatient) -> CommandResult {
    let form = map_openmrs_to_form(patient);
    let consistency = validate_data_consistency(patient, &form);

    let mut output = json!({
        "form": form,
        "consistency": consistency,
    });

    if !consistency.is_valid {
        let mut outcome =
            OperationOutcome::error(IssueType::Invalid, "Patient record did not map cleanly");
        for error in &consistency.errors {
            outcome.add_issue(OperationOutcomeIssue {
                severity: IssueSeverity::Error,
                code: IssueType::Value,
                diagnostics: Some(error.clone()),
                expression: None,
            });
        }
        output["outcome"] = serde_json::to_value(&outcome)?;
    }

    Ok(output)
}

pub fn create_request(form: &PatientFormData) -> CommandResult {
    let request = map_form_to_create_request(&sanitize_form_data(form));
    Ok(serde_json::to_value(&request)?)
}

pub fn update_request(form: &PatientFormData, existing: &BackendPatient) -> CommandResult {
    let request = map_form_to_update_request(form, existing);
    Ok(serde_json::to_value(&request)?)
}

pub fn diff(original: &PatientFormData, updated: &PatientFormData) -> CommandResult {
    Ok(serde_json::to_value(compare_patient_data(original, updated))?)
}

pub fn search_summary(result: &PatientSearchResult) -> CommandResult {
    Ok(serde_json::to_value(summarize_search_results(result))?)
}

pub fn draft(store: &DraftStore, action: DraftCommand) -> CommandResult {
    match action {
        DraftCommand::Save { key, form, step } => {
            let key = DraftKey::parse(&key)?;
            let saved = store.save(&key, &read_form(&form)?, step)?;
            tracing::info!("Draft {} saved", key);
            Ok(serde_json::to_value(&saved)?)
        }
        DraftCommand::Load { key } => {
            let key = DraftKey::parse(&key)?;
            Ok(serde_json::to_value(store.load(&key)?)?)
        }
        DraftCommand::Clear { key } => {
            let key = DraftKey::parse(&key)?;
            let cleared = store.clear(&key)?;
            Ok(json!({ "key": key.to_string(), "cleared": cleared }))
        }
        DraftCommand::List => {
            let keys: Vec<String> = store.list_keys()?.iter().map(ToString::to_string).collect();
            Ok(json!(keys))
        }
    }
}
