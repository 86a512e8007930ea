//! Registration wizard state machine.
//!
//! Navigation is gated purely on the validation results the step
//! components report. A step auto-completes once it reports a valid and
//! complete result, and stays completed afterwards even if a later edit
//! makes it invalid again.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{RegistraError, Result};
use crate::model::PatientFormData;
use crate::validation::{FormValidationResult, PatientValidator};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    Demographics,
    Identifiers,
    Address,
    Attributes,
    Photo,
    Summary,
}

impl WizardStep {
    pub const ALL: [WizardStep; 6] = [
        WizardStep::Demographics,
        WizardStep::Identifiers,
        WizardStep::Address,
        WizardStep::Attributes,
        WizardStep::Photo,
        WizardStep::Summary,
    ];

    /// 1-based position in the wizard.
    pub fn number(&self) -> u8 {
        match self {
            WizardStep::Demographics => 1,
            WizardStep::Identifiers => 2,
            WizardStep::Address => 3,
            WizardStep::Attributes => 4,
            WizardStep::Photo => 5,
            WizardStep::Summary => 6,
        }
    }

    pub fn from_number(number: u8) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.number() == number)
            .ok_or(RegistraError::InvalidStep(number))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStep::Demographics => "demographics",
            WizardStep::Identifiers => "identifiers",
            WizardStep::Address => "address",
            WizardStep::Attributes => "attributes",
            WizardStep::Photo => "photo",
            WizardStep::Summary => "summary",
        }
    }

    /// Steps that must be completed before moving past them.
    pub fn is_required(&self) -> bool {
        matches!(self, WizardStep::Demographics | WizardStep::Identifiers)
    }

    pub fn next(&self) -> Option<Self> {
        Self::from_number(self.number() + 1).ok()
    }

    pub fn previous(&self) -> Option<Self> {
        self.number()
            .checked_sub(1)
            .and_then(|n| Self::from_number(n).ok())
    }

    pub fn first() -> Self {
        WizardStep::Demographics
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WizardStep {
    type Err = RegistraError;

    /// Accepts a step id (`identifiers`) or its number (`2`).
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(number) = s.parse::<u8>() {
            return Self::from_number(number);
        }
        Self::ALL
            .into_iter()
            .find(|step| step.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| RegistraError::UnknownStep(s.to_string()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WizardStepValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub is_complete: bool,
}

impl WizardStepValidation {
    pub fn valid_incomplete() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            is_complete: false,
        }
    }

    pub fn invalid_incomplete() -> Self {
        Self::default()
    }
}

impl From<&FormValidationResult> for WizardStepValidation {
    fn from(result: &FormValidationResult) -> Self {
        Self {
            is_valid: result.is_valid,
            errors: result.errors.values().cloned().collect(),
            is_complete: result.is_valid && result.missing_required.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    pub current_step: WizardStep,
    pub completed_steps: BTreeSet<WizardStep>,
    pub step_validation: BTreeMap<WizardStep, WizardStepValidation>,
    pub is_submitting: bool,
    pub has_unsaved_changes: bool,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self {
            current_step: WizardStep::first(),
            completed_steps: BTreeSet::new(),
            step_validation: default_step_validation(),
            is_submitting: false,
            has_unsaved_changes: false,
        }
    }

    pub fn validation(&self, step: WizardStep) -> Option<&WizardStepValidation> {
        self.step_validation.get(&step)
    }

    pub fn is_step_completed(&self, step: WizardStep) -> bool {
        self.completed_steps.contains(&step)
    }

    /// Backward moves are always allowed; forward moves need every
    /// required step before `target` to be completed.
    pub fn can_go_to_step(&self, target: WizardStep) -> bool {
        if target <= self.current_step {
            return true;
        }
        WizardStep::ALL
            .iter()
            .take_while(|step| **step < target)
            .filter(|step| step.is_required())
            .all(|step| self.completed_steps.contains(step))
    }

    /// Returns whether the wizard moved.
    pub fn go_to_step(&mut self, target: WizardStep) -> bool {
        if !self.can_go_to_step(target) {
            tracing::debug!("Blocked navigation {} -> {}", self.current_step, target);
            return false;
        }
        self.current_step = target;
        true
    }

    pub fn can_go_next(&self) -> bool {
        self.current_step.next().is_some()
            && self
                .validation(self.current_step)
                .is_some_and(|v| v.is_valid)
    }

    pub fn go_to_next_step(&mut self) -> bool {
        if !self.can_go_next() {
            return false;
        }
        match self.current_step.next() {
            Some(next) => {
                self.current_step = next;
                true
            }
            None => false,
        }
    }

    pub fn go_to_previous_step(&mut self) -> bool {
        match self.current_step.previous() {
            Some(previous) => {
                self.current_step = previous;
                true
            }
            None => false,
        }
    }

    /// Store a step's result; a valid and complete result also marks the
    /// step completed. Completion is never revoked here.
    pub fn set_step_validation(&mut self, step: WizardStep, validation: WizardStepValidation) {
        if validation.is_valid && validation.is_complete {
            self.completed_steps.insert(step);
        }
        self.step_validation.insert(step, validation);
    }

    pub fn mark_step_completed(&mut self, step: WizardStep) {
        self.completed_steps.insert(step);
    }

    /// Run the step validator for `step` and record the outcome.
    pub fn validate_and_record(
        &mut self,
        step: WizardStep,
        form: &PatientFormData,
        validator: &PatientValidator,
    ) -> FormValidationResult {
        let result = validator.validate_form_step(form, step);
        self.set_step_validation(step, WizardStepValidation::from(&result));
        result
    }

    pub fn mark_unsaved_changes(&mut self) {
        self.has_unsaved_changes = true;
    }

    pub fn mark_saved(&mut self) {
        self.has_unsaved_changes = false;
    }

    pub fn set_submitting(&mut self, submitting: bool) {
        self.is_submitting = submitting;
    }

    /// Submission happens from the summary step once it validates.
    pub fn can_submit(&self) -> bool {
        self.current_step == WizardStep::Summary
            && !self.is_submitting
            && self
                .validation(WizardStep::Summary)
                .is_some_and(|v| v.is_valid)
    }

    /// Completed steps as a percentage of all steps.
    pub fn progress(&self) -> u8 {
        (self.completed_steps.len() * 100 / WizardStep::ALL.len()) as u8
    }

    pub fn reset_wizard(&mut self) {
        *self = Self::new();
    }
}

/// Photo is optional and starts out valid; every other step starts
/// invalid until its component reports.
fn default_step_validation() -> BTreeMap<WizardStep, WizardStepValidation> {
    WizardStep::ALL
        .into_iter()
        .map(|step| {
            let validation = if step == WizardStep::Photo {
                WizardStepValidation::valid_incomplete()
            } else {
                WizardStepValidation::invalid_incomplete()
            };
            (step, validation)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> WizardStepValidation {
        WizardStepValidation {
            is_valid: true,
            errors: Vec::new(),
            is_complete: true,
        }
    }

    #[test]
    fn test_initial_state() {
        let state = WizardState::new();
        assert_eq!(state.current_step, WizardStep::Demographics);
        assert!(state.completed_steps.is_empty());
        assert!(state.validation(WizardStep::Photo).unwrap().is_valid);
        assert!(!state.validation(WizardStep::Address).unwrap().is_valid);
        assert!(!state.can_go_next());
    }

    #[test]
    fn test_step_numbers() {
        assert_eq!(WizardStep::from_number(6).unwrap(), WizardStep::Summary);
        assert!(WizardStep::from_number(0).is_err());
        assert!(WizardStep::from_number(7).is_err());
        assert_eq!("address".parse::<WizardStep>().unwrap(), WizardStep::Address);
        assert_eq!("2".parse::<WizardStep>().unwrap(), WizardStep::Identifiers);
        assert!("billing".parse::<WizardStep>().is_err());
        assert_eq!(WizardStep::Demographics.previous(), None);
        assert_eq!(WizardStep::Summary.next(), None);
    }

    #[test]
    fn test_next_requires_valid_current_step() {
        let mut state = WizardState::new();
        let before = state.clone();
        assert!(!state.go_to_next_step());
        assert_eq!(state, before);

        state.set_step_validation(WizardStep::Demographics, complete());
        assert!(state.go_to_next_step());
        assert_eq!(state.current_step, WizardStep::Identifiers);
    }

    #[test]
    fn test_valid_but_incomplete_does_not_complete() {
        let mut state = WizardState::new();
        state.set_step_validation(WizardStep::Demographics, WizardStepValidation::valid_incomplete());
        assert!(!state.is_step_completed(WizardStep::Demographics));
        assert!(state.can_go_next());
    }

    #[test]
    fn test_completion_is_one_way() {
        let mut state = WizardState::new();
        state.set_step_validation(WizardStep::Demographics, complete());
        state.set_step_validation(WizardStep::Demographics, WizardStepValidation::invalid_incomplete());
        assert!(state.is_step_completed(WizardStep::Demographics));
        assert!(!state.validation(WizardStep::Demographics).unwrap().is_valid);
    }

    #[test]
    fn test_forward_jump_gated_on_required_steps() {
        let mut state = WizardState::new();
        assert!(!state.can_go_to_step(WizardStep::Identifiers));
        assert!(!state.go_to_step(WizardStep::Summary));

        state.mark_step_completed(WizardStep::Demographics);
        assert!(state.can_go_to_step(WizardStep::Identifiers));
        assert!(!state.can_go_to_step(WizardStep::Summary));

        state.mark_step_completed(WizardStep::Identifiers);
        assert!(state.go_to_step(WizardStep::Summary));
        assert!(state.can_go_to_step(WizardStep::Demographics));
    }

    #[test]
    fn test_previous_bounded() {
        let mut state = WizardState::new();
        assert!(!state.go_to_previous_step());
        state.current_step = WizardStep::Address;
        assert!(state.go_to_previous_step());
        assert_eq!(state.current_step, WizardStep::Identifiers);
    }

    #[test]
    fn test_next_bounded_at_summary() {
        let mut state = WizardState::new();
        state.current_step = WizardStep::Summary;
        state.set_step_validation(WizardStep::Summary, complete());
        assert!(!state.can_go_next());
        assert!(!state.go_to_next_step());
        assert!(state.can_submit());
        state.set_submitting(true);
        assert!(!state.can_submit());
    }

    #[test]
    fn test_reset() {
        let mut state = WizardState::new();
        state.set_step_validation(WizardStep::Demographics, complete());
        state.set_step_validation(WizardStep::Photo, WizardStepValidation::invalid_incomplete());
        state.go_to_next_step();
        state.mark_unsaved_changes();
        state.reset_wizard();
        assert_eq!(state, WizardState::new());
    }

    #[test]
    fn test_progress() {
        let mut state = WizardState::new();
        assert_eq!(state.progress(), 0);
        state.mark_step_completed(WizardStep::Demographics);
        state.mark_step_completed(WizardStep::Identifiers);
        state.mark_step_completed(WizardStep::Address);
        assert_eq!(state.progress(), 50);
    }
}
