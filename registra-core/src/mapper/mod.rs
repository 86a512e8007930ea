//! Mapping between backend patients, form data and request bodies.
//!
//! All functions are pure: inputs are borrowed and new values returned.

pub mod helpers;

pub use helpers::{
    calculate_age, calculate_age_on, calculate_birthdate_from_age,
    calculate_birthdate_from_age_on, format_date_for_display, parse_iso_date,
    sanitize_form_data,
};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

use crate::backend::{BackendPatient, PatientSearchResult};
use crate::model::{
    ADDRESS_FIELDS, FormAddress, FormAttribute, FormIdentifier, PatientFormData,
};
use crate::request::{
    AddressPayload, AttributePayload, CreatePatientRequest, IdentifierPayload, NamePayload,
    PatientPayload, PersonPayload, UpdatePatientRequest,
};

/// Old and new value of a changed field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub old_value: Value,
    pub new_value: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// One row of a patient search listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub uuid: String,
    pub display_name: String,
    pub identifier: String,
    pub gender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    pub birthdate: String,
}

/// Backend patient to form data. The first name and first address are
/// canonical; references shrink to their uuid; absent collections become
/// empty values rather than missing ones.
pub fn map_openmrs_to_form(patient: &BackendPatient) -> PatientFormData {
    let person = patient.person.as_ref();
    let name = patient.first_name();

    let identifiers = patient
        .identifiers
        .iter()
        .map(|id| FormIdentifier {
            identifier: id.identifier.clone(),
            identifier_type: id
                .identifier_type
                .as_ref()
                .map(|t| t.uuid.clone())
                .unwrap_or_default(),
            location: id
                .location
                .as_ref()
                .map(|l| l.uuid.clone())
                .unwrap_or_default(),
            preferred: id.preferred,
        })
        .collect();

    let address = patient
        .first_address()
        .map(|a| FormAddress {
            address1: a.address1.clone().unwrap_or_default(),
            address2: a.address2.clone().unwrap_or_default(),
            city_village: a.city_village.clone().unwrap_or_default(),
            state_province: a.state_province.clone().unwrap_or_default(),
            country: a.country.clone().unwrap_or_default(),
            postal_code: a.postal_code.clone().unwrap_or_default(),
            county_district: a.county_district.clone().unwrap_or_default(),
            preferred: a.preferred,
        })
        .unwrap_or_default();

    let attributes = patient
        .attributes()
        .iter()
        .map(|attr| FormAttribute {
            attribute_type: attr
                .attribute_type
                .as_ref()
                .map(|t| t.uuid.clone())
                .unwrap_or_default(),
            value: attr.value_text(),
        })
        .collect();

    let birthdate = person.and_then(|p| p.birthdate.as_deref()).map(|b| {
        parse_iso_date(b)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| b.to_string())
    });

    tracing::debug!("Mapped backend patient {} to form data", patient.uuid);

    PatientFormData {
        given_name: name.and_then(|n| n.given_name.clone()).unwrap_or_default(),
        middle_name: name.and_then(|n| n.middle_name.clone()).unwrap_or_default(),
        family_name: name.and_then(|n| n.family_name.clone()).unwrap_or_default(),
        gender: person.and_then(|p| p.gender.clone()).unwrap_or_default(),
        birthdate,
        age: person.and_then(|p| p.age),
        birthdate_estimated: person.is_some_and(|p| p.birthdate_estimated),
        identifiers,
        address,
        attributes,
        photo: None,
    }
}

/// Form data to a create request. Blank identifiers/attributes are dropped;
/// birthdate and age pass through unvalidated.
pub fn map_form_to_create_request(form: &PatientFormData) -> CreatePatientRequest {
    build_payload(form, None)
}

/// Form data to an update request for `existing`.
///
/// Record uuids are re-attached by position: name and address slot 0,
/// identifiers and attributes by their index in the form. Reordering rows
/// in the form therefore re-targets those uuids.
pub fn map_form_to_update_request(
    form: &PatientFormData,
    existing: &BackendPatient,
) -> UpdatePatientRequest {
    build_payload(form, Some(existing))
}

fn build_payload(form: &PatientFormData, existing: Option<&BackendPatient>) -> PatientPayload {
    let person = existing.and_then(|p| p.person.as_ref());

    let name = NamePayload {
        uuid: existing
            .and_then(|p| p.first_name())
            .and_then(|n| known_uuid(&n.uuid)),
        given_name: form.given_name.trim().to_string(),
        middle_name: Some(form.middle_name.trim().to_string()).filter(|m| !m.is_empty()),
        family_name: form.family_name.trim().to_string(),
        preferred: true,
    };

    let addresses = if form.address.is_blank() {
        Vec::new()
    } else {
        let a = &form.address;
        vec![AddressPayload {
            uuid: existing
                .and_then(|p| p.first_address())
                .and_then(|addr| known_uuid(&addr.uuid)),
            address1: a.address1.clone(),
            address2: a.address2.clone(),
            city_village: a.city_village.clone(),
            state_province: a.state_province.clone(),
            country: a.country.clone(),
            postal_code: a.postal_code.clone(),
            county_district: a.county_district.clone(),
            preferred: true,
        }]
    };

    let identifiers = form
        .identifiers
        .iter()
        .enumerate()
        .filter(|(_, id)| !id.identifier.trim().is_empty() && !id.identifier_type.trim().is_empty())
        .map(|(idx, id)| IdentifierPayload {
            uuid: existing
                .and_then(|p| p.identifiers.get(idx))
                .and_then(|backend| known_uuid(&backend.uuid)),
            identifier: id.identifier.trim().to_string(),
            identifier_type: id.identifier_type.clone(),
            location: Some(id.location.clone()).filter(|l| !l.trim().is_empty()),
            preferred: id.preferred,
        })
        .collect();

    let attributes = form
        .attributes
        .iter()
        .enumerate()
        .filter(|(_, attr)| !attr.attribute_type.trim().is_empty() && !attr.value.trim().is_empty())
        .map(|(idx, attr)| AttributePayload {
            uuid: existing
                .and_then(|p| p.attributes().get(idx))
                .and_then(|backend| known_uuid(&backend.uuid)),
            attribute_type: attr.attribute_type.clone(),
            value: attr.value.trim().to_string(),
        })
        .collect();

    PatientPayload {
        person: PersonPayload {
            uuid: person.and_then(|p| known_uuid(&p.uuid)),
            names: vec![name],
            gender: form.gender.clone(),
            birthdate: form.birthdate.clone(),
            birthdate_estimated: form.birthdate_estimated,
            age: form.age,
            addresses,
            attributes,
        },
        identifiers,
    }
}

/// Backend records missing a uuid deserialize with an empty one.
fn known_uuid(uuid: &str) -> Option<String> {
    Some(uuid.trim()).filter(|u| !u.is_empty()).map(str::to_string)
}

/// Field-by-field differences between two forms.
///
/// Scalars and address sub-fields (`address.<field>`) are compared one by
/// one; identifiers, attributes and photo are compared as whole values.
pub fn compare_patient_data(
    original: &PatientFormData,
    updated: &PatientFormData,
) -> BTreeMap<String, FieldChange> {
    let mut changes = BTreeMap::new();
    let mut compare = |key: &str, old: Value, new: Value| {
        if old != new {
            changes.insert(
                key.to_string(),
                FieldChange {
                    old_value: old,
                    new_value: new,
                },
            );
        }
    };

    compare("givenName", json!(original.given_name), json!(updated.given_name));
    compare("middleName", json!(original.middle_name), json!(updated.middle_name));
    compare("familyName", json!(original.family_name), json!(updated.family_name));
    compare("gender", json!(original.gender), json!(updated.gender));
    compare("birthdate", json!(original.birthdate), json!(updated.birthdate));
    compare("age", json!(original.age), json!(updated.age));
    compare(
        "birthdateEstimated",
        json!(original.birthdate_estimated),
        json!(updated.birthdate_estimated),
    );

    for field in ADDRESS_FIELDS {
        compare(
            &format!("address.{}", field),
            json!(original.address.field(field)),
            json!(updated.address.field(field)),
        );
    }

    compare("identifiers", json!(original.identifiers), json!(updated.identifiers));
    compare("attributes", json!(original.attributes), json!(updated.attributes));
    compare("photo", json!(original.photo), json!(updated.photo));

    changes
}

/// Sanity check after `map_openmrs_to_form`: required data present on the
/// backend record must not have gone blank, and no identifier may be lost.
pub fn validate_data_consistency(
    original: &BackendPatient,
    mapped: &PatientFormData,
) -> ConsistencyResult {
    let mut errors = Vec::new();
    let name = original.first_name();
    let person = original.person.as_ref();

    let lost = |backend: Option<&str>, form: &str| {
        backend.is_some_and(|b| !b.trim().is_empty()) && form.trim().is_empty()
    };

    if lost(name.and_then(|n| n.given_name.as_deref()), &mapped.given_name) {
        errors.push("Given name was lost during mapping".to_string());
    }
    if lost(name.and_then(|n| n.family_name.as_deref()), &mapped.family_name) {
        errors.push("Family name was lost during mapping".to_string());
    }
    if lost(person.and_then(|p| p.gender.as_deref()), &mapped.gender) {
        errors.push("Gender was lost during mapping".to_string());
    }
    if lost(
        person.and_then(|p| p.birthdate.as_deref()),
        mapped.birthdate.as_deref().unwrap_or_default(),
    ) {
        errors.push("Birthdate was lost during mapping".to_string());
    }
    if original.identifiers.len() != mapped.identifiers.len() {
        errors.push(format!(
            "Identifier count mismatch: backend has {}, form has {}",
            original.identifiers.len(),
            mapped.identifiers.len()
        ));
    }

    if !errors.is_empty() {
        tracing::warn!(
            "Patient {} failed consistency check: {}",
            original.uuid,
            errors.join("; ")
        );
    }

    ConsistencyResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Listing rows for a search response.
pub fn summarize_search_results(result: &PatientSearchResult) -> Vec<PatientSummary> {
    result
        .results
        .iter()
        .map(|patient| {
            let form = map_openmrs_to_form(patient);
            let display_name = [&form.given_name, &form.middle_name, &form.family_name]
                .into_iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            let identifier = form
                .identifiers
                .iter()
                .find(|id| id.preferred)
                .or_else(|| form.identifiers.first())
                .map(|id| id.identifier.clone())
                .unwrap_or_default();
            let birthdate = form.birthdate_value().unwrap_or_default();
            let age = form.age.or_else(|| {
                parse_iso_date(birthdate).map(|_| i64::from(calculate_age(birthdate)))
            });

            PatientSummary {
                uuid: patient.uuid.clone(),
                display_name,
                identifier,
                gender: form.gender.clone(),
                age,
                birthdate: format_date_for_display(birthdate),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendAttribute, BackendIdentifier, BackendName, BackendPerson, Reference};

    fn backend_patient() -> BackendPatient {
        BackendPatient {
            uuid: "patient-1".to_string(),
            identifiers: vec![
                BackendIdentifier {
                    uuid: "ident-1".to_string(),
                    identifier: "100001".to_string(),
                    identifier_type: Some(Reference {
                        uuid: "id-type-1".to_string(),
                        display: Some("OpenMRS ID".to_string()),
                    }),
                    location: None,
                    preferred: true,
                    ..Default::default()
                },
                BackendIdentifier {
                    uuid: "ident-2".to_string(),
                    identifier: "NAT-9".to_string(),
                    identifier_type: Some(Reference {
                        uuid: "id-type-2".to_string(),
                        display: None,
                    }),
                    location: Some(Reference {
                        uuid: "loc-1".to_string(),
                        display: None,
                    }),
                    ..Default::default()
                },
            ],
            person: Some(BackendPerson {
                uuid: "person-1".to_string(),
                gender: Some("F".to_string()),
                birthdate: Some("1990-03-02T00:00:00.000+0000".to_string()),
                names: vec![BackendName {
                    uuid: "name-1".to_string(),
                    given_name: Some("Grace".to_string()),
                    family_name: Some("Nakato".to_string()),
                    preferred: true,
                    ..Default::default()
                }],
                attributes: vec![BackendAttribute {
                    uuid: "attr-1".to_string(),
                    attribute_type: Some(Reference {
                        uuid: "attr-phone".to_string(),
                        display: None,
                    }),
                    value: json!("+256700000000"),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_map_to_form() {
        let form = map_openmrs_to_form(&backend_patient());
        assert_eq!(form.given_name, "Grace");
        assert_eq!(form.middle_name, "");
        assert_eq!(form.birthdate.as_deref(), Some("1990-03-02"));
        assert_eq!(form.identifiers[0].identifier_type, "id-type-1");
        assert_eq!(form.identifiers[0].location, "");
        assert_eq!(form.identifiers[1].location, "loc-1");
        assert_eq!(form.attributes[0].attribute_type, "attr-phone");
        assert_eq!(form.address, FormAddress::default());
    }

    #[test]
    fn test_map_empty_patient_gives_blank_form() {
        let form = map_openmrs_to_form(&BackendPatient::default());
        assert_eq!(form, PatientFormData::default());
    }

    #[test]
    fn test_create_request_filters_blank_rows() {
        let mut form = map_openmrs_to_form(&backend_patient());
        form.identifiers.push(FormIdentifier {
            identifier: "300".to_string(),
            ..Default::default()
        });
        form.attributes.push(FormAttribute {
            attribute_type: "attr-email".to_string(),
            value: " ".to_string(),
        });

        let request = map_form_to_create_request(&form);
        assert_eq!(request.identifiers.len(), 2);
        assert_eq!(request.person.attributes.len(), 1);
        assert!(request.person.addresses.is_empty());
        assert!(request.person.uuid.is_none());
        assert!(request.person.names[0].preferred);
        assert!(request.identifiers.iter().all(|id| id.uuid.is_none()));
    }

    #[test]
    fn test_create_request_passes_inconsistent_age_through() {
        let form = PatientFormData {
            birthdate: Some("2000-01-01".to_string()),
            age: Some(90),
            ..Default::default()
        };
        let request = map_form_to_create_request(&form);
        assert_eq!(request.person.birthdate.as_deref(), Some("2000-01-01"));
        assert_eq!(request.person.age, Some(90));
    }

    #[test]
    fn test_update_request_reattaches_uuids_by_position() {
        let existing = backend_patient();
        let mut form = map_openmrs_to_form(&existing);
        form.address.city_village = "Gulu".to_string();

        let request = map_form_to_update_request(&form, &existing);
        assert_eq!(request.person.uuid.as_deref(), Some("person-1"));
        assert_eq!(request.person.names[0].uuid.as_deref(), Some("name-1"));
        assert_eq!(request.identifiers[0].uuid.as_deref(), Some("ident-1"));
        assert_eq!(request.identifiers[1].uuid.as_deref(), Some("ident-2"));
        assert_eq!(request.person.attributes[0].uuid.as_deref(), Some("attr-1"));
        // backend had no address record to match
        assert_eq!(request.person.addresses[0].uuid, None);

        // swapping rows swaps which record each uuid targets
        form.identifiers.swap(0, 1);
        let request = map_form_to_update_request(&form, &existing);
        assert_eq!(request.identifiers[0].identifier, "NAT-9");
        assert_eq!(request.identifiers[0].uuid.as_deref(), Some("ident-1"));
    }

    #[test]
    fn test_update_request_skips_missing_uuids() {
        let mut existing = backend_patient();
        existing.identifiers[0].uuid.clear();
        if let Some(person) = existing.person.as_mut() {
            person.uuid.clear();
        }
        let form = map_openmrs_to_form(&existing);

        let request = map_form_to_update_request(&form, &existing);
        assert_eq!(request.person.uuid, None);
        assert_eq!(request.identifiers[0].uuid, None);
        assert_eq!(request.identifiers[1].uuid.as_deref(), Some("ident-2"));

        let json = serde_json::to_value(&request).unwrap();
        assert!(json["person"].get("uuid").is_none());
        assert!(json["identifiers"][0].get("uuid").is_none());
    }

    #[test]
    fn test_update_request_trims_text_keeping_positions() {
        let existing = backend_patient();
        let mut form = map_openmrs_to_form(&existing);
        form.given_name = "  Grace ".to_string();
        form.family_name = "Nakato  ".to_string();
        form.identifiers[1].identifier = " NAT-9 ".to_string();

        let request = map_form_to_update_request(&form, &existing);
        let name = &request.person.names[0];
        assert_eq!(name.given_name, "Grace");
        assert_eq!(name.family_name, "Nakato");
        assert_eq!(request.identifiers[1].identifier, "NAT-9");
        assert_eq!(request.identifiers[1].uuid.as_deref(), Some("ident-2"));
    }

    #[test]
    fn test_compare_patient_data() {
        let original = map_openmrs_to_form(&backend_patient());
        let mut updated = original.clone();
        assert!(compare_patient_data(&original, &updated).is_empty());

        updated.given_name = "Gracie".to_string();
        updated.address.country = "Uganda".to_string();
        updated.identifiers[1].identifier = "NAT-10".to_string();

        let changes = compare_patient_data(&original, &updated);
        assert_eq!(changes.len(), 3);
        assert_eq!(changes["givenName"].old_value, json!("Grace"));
        assert_eq!(changes["givenName"].new_value, json!("Gracie"));
        assert_eq!(changes["address.country"].new_value, json!("Uganda"));
        assert!(changes["identifiers"].old_value.is_array());
    }

    #[test]
    fn test_consistency_check() {
        let patient = backend_patient();
        let form = map_openmrs_to_form(&patient);
        assert!(validate_data_consistency(&patient, &form).is_valid);

        let mut broken = form.clone();
        broken.family_name.clear();
        broken.identifiers.pop();
        let result = validate_data_consistency(&patient, &broken);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_summarize_search_results() {
        let result = PatientSearchResult {
            results: vec![backend_patient()],
        };
        let rows = summarize_search_results(&result);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].display_name, "Grace Nakato");
        assert_eq!(rows[0].identifier, "100001");
        assert_eq!(rows[0].birthdate, "02/03/1990");
        assert!(rows[0].age.is_some());
    }
}
