//! Form-side patient model.
//!
//! `PatientFormData` is the in-progress representation edited by the
//! registration wizard. Values are kept raw (strings where the user types
//! free text) so validation can report on exactly what was entered.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Address sub-fields in display order.
pub const ADDRESS_FIELDS: [&str; 7] = [
    "address1",
    "address2",
    "cityVillage",
    "stateProvince",
    "country",
    "postalCode",
    "countyDistrict",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    M,
    F,
    O,
}

impl Gender {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "M" => Some(Gender::M),
            "F" => Some(Gender::F),
            "O" => Some(Gender::O),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PatientFormData {
    pub given_name: String,
    pub middle_name: String,
    pub family_name: String,
    pub gender: String,
    pub birthdate: Option<String>,
    pub age: Option<i64>,
    pub birthdate_estimated: bool,
    pub identifiers: Vec<FormIdentifier>,
    pub address: FormAddress,
    pub attributes: Vec<FormAttribute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<Photo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FormIdentifier {
    pub identifier: String,
    pub identifier_type: String,
    pub location: String,
    pub preferred: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FormAddress {
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
#[serde(default, rename_all = "camelCase")]
pub struct FormAttribute {
    pub attribute_type: String,
    pub value: String,
}

/// Uploaded photo reference. Only the metadata matters to validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Photo {
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
}

impl PatientFormData {
    /// Parse form data from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Birthdate with blank strings treated as absent.
    pub fn birthdate_value(&self) -> Option<&str> {
        self.birthdate
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Identifiers whose value is non-blank.
    pub fn filled_identifiers(&self) -> impl Iterator<Item = &FormIdentifier> {
        self.identifiers
            .iter()
            .filter(|id| !id.identifier.trim().is_empty())
    }

    /// Keep exactly one identifier preferred: the first one already marked,
    /// or the first identifier when none is.
    pub fn ensure_preferred_identifier(&mut self) {
        if self.identifiers.is_empty() {
            return;
        }
        let keep = self
            .identifiers
            .iter()
            .position(|id| id.preferred)
            .unwrap_or(0);
        for (idx, identifier) in self.identifiers.iter_mut().enumerate() {
            identifier.preferred = idx == keep;
        }
    }

    pub fn preferred_identifier_count(&self) -> usize {
        self.identifiers.iter().filter(|id| id.preferred).count()
    }
}

impl FormAddress {
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "address1" => &self.address1,
            "address2" => &self.address2,
            "cityVillage" => &self.city_village,
            "stateProvince" => &self.state_province,
            "country" => &self.country,
            "postalCode" => &self.postal_code,
            "countyDistrict" => &self.county_district,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// `(name, value)` pairs in `ADDRESS_FIELDS` order.
    pub fn fields(&self) -> [(&'static str, &str); 7] {
        [
            ("address1", self.address1.as_str()),
            ("address2", self.address2.as_str()),
            ("cityVillage", self.city_village.as_str()),
            ("stateProvince", self.state_province.as_str()),
            ("country", self.country.as_str()),
            ("postalCode", self.postal_code.as_str()),
            ("countyDistrict", self.county_district.as_str()),
        ]
    }

    pub fn is_blank(&self) -> bool {
        self.fields().iter().all(|(_, v)| v.trim().is_empty())
    }
}
