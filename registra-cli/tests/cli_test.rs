//! End-to-end command tests
//!
//! Parses real argument lists and runs them against files in a temp dir:
//! validate -> create-request -> draft save/load/list/clear -> load/update.

use clap::Parser;
use registra_cli::{cli::Cli, commands, config::CliConfig};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn config_for(dir: &TempDir) -> CliConfig {
    let mut config = CliConfig::default();
    config.storage.data_dir = dir.path().join("data");
    config
}

fn write_json(dir: &TempDir, name: &str, value: &Value) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
    path
}

fn run(config: &CliConfig, args: &[&str]) -> Value {
    let cli = Cli::try_parse_from(std::iter::once("registra").chain(args.iter().copied())).unwrap();
    commands::run(cli.command, config).unwrap()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn valid_form() -> Value {
    json!({
        "givenName": "John",
        "familyName": "Doe",
        "gender": "M",
        "birthdate": "1988-05-15",
        "identifiers": [
            {"identifier": "100001", "identifierType": "id-type-1", "preferred": true}
        ]
    })
}

fn backend_patient() -> Value {
    json!({
        "uuid": "patient-9",
        "display": "100001 - John Doe",
        "identifiers": [
            {
                "uuid": "ident-9",
                "identifier": "100001",
                "identifierType": {"uuid": "id-type-1", "display": "MRN"},
                "preferred": true
            }
        ],
        "person": {
            "uuid": "person-9",
            "gender": "M",
            "birthdate": "1988-05-15T00:00:00.000+0000",
            "names": [{"uuid": "name-9", "givenName": "John", "familyName": "Doe"}],
            "addresses": [],
            "attributes": []
        },
        "auditInfo": {"creator": "admin"}
    })
}

#[test]
fn test_validate_command() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    let form = write_json(&dir, "form.json", &valid_form());

    let result = run(&config, &["validate", path_str(&form)]);
    assert_eq!(result["isValid"], true);
    assert_eq!(result["completeness"], 100);

    let step = run(&config, &["validate", path_str(&form), "--step", "2"]);
    assert_eq!(step["isValid"], true);

    let outcome = run(&config, &["validate", path_str(&form), "--outcome"]);
    assert_eq!(outcome["resourceType"], "OperationOutcome");
    assert_eq!(outcome["issue"][0]["severity"], "information");
}

#[test]
fn test_validate_invalid_form_as_outcome() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    let form = write_json(&dir, "form.json", &json!({"familyName": "Doe", "gender": "X"}));

    let outcome = run(&config, &["validate", path_str(&form), "--outcome"]);
    let issues = outcome["issue"].as_array().unwrap();
    assert!(issues.iter().any(|i| i["code"] == "required"));
    assert!(issues
        .iter()
        .any(|i| i["expression"][0] == "Patient.gender"));
}

#[test]
fn test_field_command() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);

    let ok = run(&config, &["field", "givenName", "Mary"]);
    assert_eq!(ok["isValid"], true);

    let bad = run(&config, &["field", "gender", "Q"]);
    assert_eq!(bad["isValid"], false);
    assert_eq!(bad["code"], "INVALID_GENDER");
}

#[test]
fn test_field_command_with_extreme_age_in_form() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    let form = write_json(
        &dir,
        "form.json",
        &json!({"age": i64::MIN, "birthdate": "1990-01-01"}),
    );

    let birthdate = run(
        &config,
        &["field", "birthdate", "1990-01-01", "--form", path_str(&form)],
    );
    assert_eq!(birthdate["isValid"], true);

    let validated = run(&config, &["validate", path_str(&form)]);
    assert_eq!(validated["isValid"], false);
    assert!(validated["errors"]["age"].is_string());
}

#[test]
fn test_create_request_command() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    let mut form = valid_form();
    form["givenName"] = json!("  John ");
    form["identifiers"]
        .as_array_mut()
        .unwrap()
        .push(json!({"identifier": "", "identifierType": "id-type-2"}));
    let path = write_json(&dir, "form.json", &form);

    let request = run(&config, &["create-request", path_str(&path)]);
    assert_eq!(request["person"]["names"][0]["givenName"], "John");
    assert_eq!(request["identifiers"].as_array().unwrap().len(), 1);
    assert!(request["person"].get("uuid").is_none());
}

#[test]
fn test_load_and_update_request() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    let patient = write_json(&dir, "patient.json", &backend_patient());

    let loaded = run(&config, &["load", path_str(&patient)]);
    assert_eq!(loaded["consistency"]["isValid"], true);
    assert!(loaded.get("outcome").is_none());
    assert_eq!(loaded["form"]["birthdate"], "1988-05-15");

    let mut form = loaded["form"].clone();
    form["familyName"] = json!(" Dough ");
    let form_path = write_json(&dir, "edited.json", &form);

    let request = run(
        &config,
        &["update-request", path_str(&form_path), path_str(&patient)],
    );
    assert_eq!(request["person"]["uuid"], "person-9");
    assert_eq!(request["person"]["names"][0]["uuid"], "name-9");
    assert_eq!(request["person"]["names"][0]["familyName"], "Dough");
    assert_eq!(request["identifiers"][0]["uuid"], "ident-9");
}

#[test]
fn test_load_sparse_patient() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    let path = write_json(&dir, "patient.json", &json!({"uuid": "bare"}));

    let loaded = run(&config, &["load", path_str(&path)]);
    assert_eq!(loaded["consistency"]["isValid"], true);
    assert_eq!(loaded["form"]["givenName"], "");
    assert_eq!(loaded["form"]["identifiers"], json!([]));
}

#[test]
fn test_diff_command() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    let original = write_json(&dir, "a.json", &valid_form());
    let mut updated = valid_form();
    updated["gender"] = json!("F");
    updated["address"] = json!({"cityVillage": "Gulu"});
    let updated = write_json(&dir, "b.json", &updated);

    let diff = run(&config, &["diff", path_str(&original), path_str(&updated)]);
    assert_eq!(diff["gender"]["oldValue"], "M");
    assert_eq!(diff["gender"]["newValue"], "F");
    assert_eq!(diff["address.cityVillage"]["newValue"], "Gulu");
    assert!(diff.get("givenName").is_none());
}

#[test]
fn test_search_summary_command() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    let results = write_json(&dir, "search.json", &json!({"results": [backend_patient()]}));

    let summary = run(&config, &["search-summary", path_str(&results)]);
    let rows = summary.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["uuid"], "patient-9");
    assert_eq!(rows[0]["displayName"], "John Doe");
    assert_eq!(rows[0]["identifier"], "100001");
}

#[test]
fn test_draft_lifecycle() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    let form = write_json(&dir, "form.json", &valid_form());
    let key = "patient-form-draft-create-new";

    let saved = run(
        &config,
        &["draft", "save", key, path_str(&form), "--step", "identifiers"],
    );
    assert_eq!(saved["currentStep"], "identifiers");
    assert!(config.drafts_db_path().exists());

    let loaded = run(&config, &["draft", "load", key]);
    assert_eq!(loaded["form"]["givenName"], "John");

    let keys = run(&config, &["draft", "list"]);
    assert_eq!(keys, json!([key]));

    let cleared = run(&config, &["draft", "clear", key]);
    assert_eq!(cleared["cleared"], true);

    let missing = run(&config, &["draft", "load", key]);
    assert!(missing.is_null());
}

#[test]
fn test_draft_rejects_bad_key() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    let cli = Cli::try_parse_from(["registra", "draft", "load", "some-other-key"]).unwrap();
    assert!(commands::run(cli.command, &config).is_err());
}

#[test]
fn test_invalid_step_rejected_by_parser() {
    assert!(Cli::try_parse_from(["registra", "validate", "form.json", "--step", "9"]).is_err());
}
