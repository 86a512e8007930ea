//! Backend patient shapes as returned by the clinical records REST API.
//!
//! Only the fields the registration forms use are typed. Everything else
//! (audit info, links, voided flags) lands in the flattened `rest` maps and
//! is serialized back untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackendPatient {
    pub uuid: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    pub identifiers: Vec<BackendIdentifier>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub person: Option<BackendPerson>,

    /// All other fields are stored here
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackendPerson {
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
    pub birthdate_estimated: bool,
    pub names: Vec<BackendName>,
    pub addresses: Vec<BackendAddress>,
    pub attributes: Vec<BackendAttribute>,

    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackendName {
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    pub preferred: bool,

    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackendAddress {
    pub uuid: String,
    pub preferred: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_village: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub county_district: Option<String>,

    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackendIdentifier {
    pub uuid: String,
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_type: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Reference>,
    pub preferred: bool,

    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackendAttribute {
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_type: Option<Reference>,
    /// Plain string, or an object for coded values.
    pub value: Value,

    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// `{uuid, display}` reference to another backend record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Reference {
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// Response body of the patient search endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientSearchResult {
    pub results: Vec<BackendPatient>,
}

impl BackendPatient {
    /// Parse a patient from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Convert the patient to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn first_name(&self) -> Option<&BackendName> {
        self.person.as_ref().and_then(|p| p.names.first())
    }

    pub fn first_address(&self) -> Option<&BackendAddress> {
        self.person.as_ref().and_then(|p| p.addresses.first())
    }

    pub fn attributes(&self) -> &[BackendAttribute] {
        self.person
            .as_ref()
            .map(|p| p.attributes.as_slice())
            .unwrap_or(&[])
    }
}

impl BackendAttribute {
    /// Attribute value as form text: strings pass through, coded values
    /// reduce to their uuid (or display when there is none).
    pub fn value_text(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            Value::Object(obj) => obj
                .get("uuid")
                .or_else(|| obj.get("display"))
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            other => other.to_string(),
        }
    }
}
