//! ReDB-backed draft auto-save
//!
//! Key format:
//!   - patient-form-draft-create-new
//!   - patient-form-draft-edit-{patient_uuid}
//!
//! Values are JSON-encoded `Draft` records.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use redb::{Database, TableDefinition};
use registra_core::{PatientFormData, WizardStep};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

const DRAFTS: TableDefinition<&str, &[u8]> = TableDefinition::new("drafts");

const KEY_PREFIX: &str = "patient-form-draft-";
const NEW_PATIENT: &str = "new";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FormMode {
    Create,
    Edit,
}

impl FormMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormMode::Create => "create",
            FormMode::Edit => "edit",
        }
    }
}

/// Identifies one in-progress form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftKey {
    pub mode: FormMode,
    pub patient_uuid: Option<String>,
}

#[allow(clippy::result_large_err)]
impl DraftKey {
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            patient_uuid: None,
        }
    }

    /// Key for editing an existing patient. `new` is reserved for the
    /// placeholder segment and is rejected along with blank uuids.
    pub fn edit(patient_uuid: impl Into<String>) -> Result<Self> {
        let patient_uuid = patient_uuid.into();
        if patient_uuid.trim().is_empty() || patient_uuid == NEW_PATIENT {
            return Err(StoreError::InvalidKey(format!(
                "{}{}-{}",
                KEY_PREFIX,
                FormMode::Edit.as_str(),
                patient_uuid
            )));
        }
        Ok(Self {
            mode: FormMode::Edit,
            patient_uuid: Some(patient_uuid),
        })
    }

    /// Parse `patient-form-draft-<mode>-<uuid|new>`.
    pub fn parse(key: &str) -> Result<Self> {
        let invalid = || StoreError::InvalidKey(key.to_string());

        let rest = key.strip_prefix(KEY_PREFIX).ok_or_else(invalid)?;
        let (mode, patient) = rest.split_once('-').ok_or_else(invalid)?;
        let mode = match mode {
            "create" => FormMode::Create,
            "edit" => FormMode::Edit,
            _ => return Err(invalid()),
        };
        let patient_uuid = match patient {
            "" => return Err(invalid()),
            NEW_PATIENT => None,
            uuid => Some(uuid.to_string()),
        };

        Ok(Self { mode, patient_uuid })
    }
}

impl fmt::Display for DraftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}-{}",
            KEY_PREFIX,
            self.mode.as_str(),
            self.patient_uuid.as_deref().unwrap_or(NEW_PATIENT)
        )
    }
}

impl FromStr for DraftKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A saved form together with where the user was in the wizard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub form: PatientFormData,
    pub current_step: WizardStep,
    pub saved_at: DateTime<Utc>,
}

/// ReDB-backed draft store
pub struct DraftStore {
    db: Database,
}

#[allow(clippy::result_large_err)]
impl DraftStore {
    /// Open the store (create if not exists)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(DRAFTS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Save (or overwrite) the draft under `key`, stamped with the current time.
    pub fn save(&self, key: &DraftKey, form: &PatientFormData, step: WizardStep) -> Result<Draft> {
        let draft = Draft {
            form: form.clone(),
            current_step: step,
            saved_at: Utc::now(),
        };
        let data = serde_json::to_vec(&draft)?;
        let key_text = key.to_string();

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(DRAFTS)?;
            table.insert(key_text.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;

        tracing::debug!("Saved draft {} at step {}", key_text, step);
        Ok(draft)
    }

    pub fn load(&self, key: &DraftKey) -> Result<Option<Draft>> {
        let key_text = key.to_string();
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DRAFTS)?;

        match table.get(key_text.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Returns whether a draft was removed.
    pub fn clear(&self, key: &DraftKey) -> Result<bool> {
        let key_text = key.to_string();
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(DRAFTS)?;
            table.remove(key_text.as_str())?.is_some()
        };
        write_txn.commit()?;

        if removed {
            tracing::debug!("Cleared draft {}", key_text);
        }
        Ok(removed)
    }

    /// Keys of all stored drafts, in key order. Unrecognised keys are skipped.
    pub fn list_keys(&self) -> Result<Vec<DraftKey>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DRAFTS)?;

        let mut keys = Vec::new();
        for entry in table.range::<&str>(..)? {
            let (key, _) = entry?;
            match DraftKey::parse(key.value()) {
                Ok(parsed) => keys.push(parsed),
                Err(e) => tracing::warn!("Skipping stored draft: {}", e),
            }
        }

        Ok(keys)
    }
}
