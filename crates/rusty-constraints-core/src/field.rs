// File: rusty-constraints-core/src/field.rs
// Purpose: Validation outcomes recorded for one named input

use serde::{Deserialize, Serialize};

use crate::input::InputSnapshot;
use crate::key::FeedbackKey;

/// Whether a rule fired during the last validation pass
///
/// `NotEvaluated` means the rule was never checked (not validated yet, or
/// skipped by its group's stop policy). It is not the same as `NotFired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Fired {
    Fired,
    NotFired,
    NotEvaluated,
}

impl Fired {
    pub fn is_fired(&self) -> bool {
        matches!(self, Fired::Fired)
    }

    pub fn is_evaluated(&self) -> bool {
        !matches!(self, Fired::NotEvaluated)
    }
}

impl From<bool> for Fired {
    fn from(fired: bool) -> Self {
        if fired {
            Fired::Fired
        } else {
            Fired::NotFired
        }
    }
}

/// Severity of a recorded outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeedbackKind {
    Error,
    Warning,
    Info,
    /// Fires when the whole field is valid
    WhenValid,
}

/// Result of one rule for one validation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValidation {
    pub key: FeedbackKey,
    pub kind: FeedbackKind,
    pub fired: Fired,
}

impl FieldValidation {
    pub fn new(key: FeedbackKey, kind: FeedbackKind, fired: Fired) -> Self {
        Self { key, kind, fired }
    }
}

/// Outcomes for one named input, in the order the rules were declared
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    name: String,
    validations: Vec<FieldValidation>,
    element: Option<InputSnapshot>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            validations: Vec::new(),
            element: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn validations(&self) -> &[FieldValidation] {
        &self.validations
    }

    /// Outcome recorded for a rule, if any
    pub fn validation(&self, key: &FeedbackKey) -> Option<&FieldValidation> {
        self.validations.iter().find(|v| &v.key == key)
    }

    /// The input snapshot of the last validation pass
    pub fn element(&self) -> Option<&InputSnapshot> {
        self.element.as_ref()
    }

    pub(crate) fn set_element(&mut self, element: InputSnapshot) {
        self.element = Some(element);
    }

    /// Replace the outcome with the same key in place, or append it
    pub fn add_or_replace_validation(&mut self, validation: FieldValidation) {
        match self.validations.iter_mut().find(|v| v.key == validation.key) {
            Some(existing) => *existing = validation,
            None => self.validations.push(validation),
        }
    }

    pub fn clear_validations(&mut self) {
        self.validations.clear();
    }

    pub(crate) fn remove_validation(&mut self, key: &FeedbackKey) {
        self.validations.retain(|v| &v.key != key);
    }

    fn has_fired(&self, kind: Option<FeedbackKind>, group: Option<&FeedbackKey>) -> bool {
        self.validations.iter().any(|v| {
            v.fired.is_fired()
                && group.map_or(true, |g| v.key.is_descendant_of(g))
                && match kind {
                    Some(kind) => v.kind == kind,
                    None => v.kind != FeedbackKind::WhenValid,
                }
        })
    }

    /// Any fired error, optionally restricted to one rule group
    pub fn has_errors(&self, group: Option<&FeedbackKey>) -> bool {
        self.has_fired(Some(FeedbackKind::Error), group)
    }

    pub fn has_warnings(&self, group: Option<&FeedbackKey>) -> bool {
        self.has_fired(Some(FeedbackKind::Warning), group)
    }

    pub fn has_infos(&self, group: Option<&FeedbackKey>) -> bool {
        self.has_fired(Some(FeedbackKind::Info), group)
    }

    /// Any fired error, warning or info. `WhenValid` outcomes report
    /// validity and do not count as feedback.
    pub fn has_feedbacks(&self, group: Option<&FeedbackKey>) -> bool {
        self.has_fired(None, group)
    }

    /// Warnings and infos never make a field invalid
    pub fn is_valid(&self) -> bool {
        !self.has_errors(None)
    }
}
