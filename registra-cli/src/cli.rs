use clap::{Parser, Subcommand};
use registra_core::WizardStep;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "registra")]
#[command(about = "Patient registration form validation and mapping")]
pub struct Cli {
    /// YAML config file (defaults to ./registra.yaml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a form, or one wizard step of it
    Validate {
        /// Form data (JSON)
        form: PathBuf,
        /// Wizard step number (1-6) or name
        #[arg(long)]
        step: Option<WizardStep>,
        /// Print the result as a FHIR OperationOutcome
        #[arg(long)]
        outcome: bool,
    },
    /// Validate a single field as it is typed
    Field {
        /// Field name (givenName, address.cityVillage, identifier_0, ...)
        name: String,
        /// Field value
        value: String,
        /// Form data giving context (JSON)
        #[arg(long)]
        form: Option<PathBuf>,
    },
    /// Map a backend patient to form data and check nothing was lost
    Load {
        /// Backend patient (JSON)
        patient: PathBuf,
    },
    /// Build the create-patient request body for a form
    CreateRequest {
        /// Form data (JSON)
        form: PathBuf,
    },
    /// Build the update-patient request body for a form
    UpdateRequest {
        /// Form data (JSON)
        form: PathBuf,
        /// Backend patient being edited (JSON)
        patient: PathBuf,
    },
    /// Show field changes between two forms
    Diff {
        /// Original form data (JSON)
        original: PathBuf,
        /// Updated form data (JSON)
        updated: PathBuf,
    },
    /// Summarise a patient search response
    SearchSummary {
        /// Search response (JSON)
        results: PathBuf,
    },
    /// Manage auto-saved drafts
    Draft {
        #[command(subcommand)]
        action: DraftCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum DraftCommand {
    /// Save a form under a draft key
    Save {
        /// Draft key (patient-form-draft-<create|edit>-<uuid|new>)
        key: String,
        /// Form data (JSON)
        form: PathBuf,
        /// Wizard step the user is on
        #[arg(long, default_value = "demographics")]
        step: WizardStep,
    },
    /// Print a saved draft (null when absent)
    Load {
        /// Draft key
        key: String,
    },
    /// Remove a saved draft
    Clear {
        /// Draft key
        key: String,
    },
    /// List saved draft keys
    List,
}
