//! Create/update request bodies for the patient REST endpoint.
//!
//! The same shape serves both calls; on update the `uuid` fields carry the
//! identities of the records being replaced.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientPayload {
    pub person: PersonPayload,
    pub identifiers: Vec<IdentifierPayload>,
}

pub type CreatePatientRequest = PatientPayload;
pub type UpdatePatientRequest = PatientPayload;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub names: Vec<NamePayload>,
    pub gender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
    pub birthdate_estimated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    pub addresses: Vec<AddressPayload>,
    pub attributes: Vec<AttributePayload>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NamePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub given_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub family_name: String,
    pub preferred: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddressPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub address1: String,
    pub address2: String,
    pub city_village: String,
    pub state_province: String,
    pub country: String,
    pub postal_code: String,
    pub county_district: String,
    pub preferred: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub identifier: String,
    pub identifier_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub preferred: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttributePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub attribute_type: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_backend_field_names() {
        let payload = PatientPayload {
            person: PersonPayload {
                names: vec![NamePayload {
                    given_name: "Jane".to_string(),
                    family_name: "Doe".to_string(),
                    preferred: true,
                    ..Default::default()
                }],
                gender: "F".to_string(),
                addresses: vec![AddressPayload {
                    address1: "Plot 4".to_string(),
                    preferred: true,
                    ..Default::default()
                }],
                ..Default::default()
            },
            identifiers: vec![IdentifierPayload {
                identifier: "100001".to_string(),
                identifier_type: "id-type-1".to_string(),
                preferred: true,
                ..Default::default()
            }],
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["person"]["names"][0]["givenName"], "Jane");
        assert_eq!(value["person"]["addresses"][0]["address1"], "Plot 4");
        assert_eq!(value["identifiers"][0]["identifierType"], "id-type-1");
        assert!(value["person"].get("uuid").is_none());
        assert!(value["identifiers"][0].get("location").is_none());
        assert_eq!(value["person"]["birthdateEstimated"], json!(false));
    }
}
