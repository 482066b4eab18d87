// File: rusty-constraints-core/src/input.rs
// Purpose: Immutable input snapshots and constraint-violation flags

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// HTML constraint-violation names, spelled the way the DOM spells them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Constraint {
    BadInput,
    PatternMismatch,
    RangeOverflow,
    RangeUnderflow,
    StepMismatch,
    TooLong,
    TooShort,
    TypeMismatch,
    ValueMissing,
}

impl Constraint {
    pub const ALL: [Constraint; 9] = [
        Constraint::BadInput,
        Constraint::PatternMismatch,
        Constraint::RangeOverflow,
        Constraint::RangeUnderflow,
        Constraint::StepMismatch,
        Constraint::TooLong,
        Constraint::TooShort,
        Constraint::TypeMismatch,
        Constraint::ValueMissing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Constraint::BadInput => "badInput",
            Constraint::PatternMismatch => "patternMismatch",
            Constraint::RangeOverflow => "rangeOverflow",
            Constraint::RangeUnderflow => "rangeUnderflow",
            Constraint::StepMismatch => "stepMismatch",
            Constraint::TooLong => "tooLong",
            Constraint::TooShort => "tooShort",
            Constraint::TypeMismatch => "typeMismatch",
            Constraint::ValueMissing => "valueMissing",
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Constraint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Constraint::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownConstraint {
                name: s.to_string(),
            })
    }
}

/// Browser-computed validity flags for one input, consumed as plain data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidityState {
    pub valid: bool,
    pub bad_input: bool,
    pub pattern_mismatch: bool,
    pub range_overflow: bool,
    pub range_underflow: bool,
    pub step_mismatch: bool,
    pub too_long: bool,
    pub too_short: bool,
    pub type_mismatch: bool,
    pub value_missing: bool,
}

impl ValidityState {
    /// No violation at all
    pub fn valid() -> Self {
        Self {
            valid: true,
            bad_input: false,
            pattern_mismatch: false,
            range_overflow: false,
            range_underflow: false,
            step_mismatch: false,
            too_long: false,
            too_short: false,
            type_mismatch: false,
            value_missing: false,
        }
    }

    /// Build from a list of violations; `valid` is derived
    pub fn from_violations(violations: impl IntoIterator<Item = Constraint>) -> Self {
        let mut state = Self::valid();
        for violation in violations {
            state.set(violation);
        }
        state
    }

    pub fn is_set(&self, constraint: Constraint) -> bool {
        match constraint {
            Constraint::BadInput => self.bad_input,
            Constraint::PatternMismatch => self.pattern_mismatch,
            Constraint::RangeOverflow => self.range_overflow,
            Constraint::RangeUnderflow => self.range_underflow,
            Constraint::StepMismatch => self.step_mismatch,
            Constraint::TooLong => self.too_long,
            Constraint::TooShort => self.too_short,
            Constraint::TypeMismatch => self.type_mismatch,
            Constraint::ValueMissing => self.value_missing,
        }
    }

    /// Raise a violation flag; the state stops being valid
    pub fn set(&mut self, constraint: Constraint) {
        let flag = match constraint {
            Constraint::BadInput => &mut self.bad_input,
            Constraint::PatternMismatch => &mut self.pattern_mismatch,
            Constraint::RangeOverflow => &mut self.range_overflow,
            Constraint::RangeUnderflow => &mut self.range_underflow,
            Constraint::StepMismatch => &mut self.step_mismatch,
            Constraint::TooLong => &mut self.too_long,
            Constraint::TooShort => &mut self.too_short,
            Constraint::TypeMismatch => &mut self.type_mismatch,
            Constraint::ValueMissing => &mut self.value_missing,
        };
        *flag = true;
        self.valid = false;
    }

    pub fn violations(&self) -> Vec<Constraint> {
        Constraint::ALL
            .into_iter()
            .filter(|c| self.is_set(*c))
            .collect()
    }
}

impl Default for ValidityState {
    fn default() -> Self {
        Self::valid()
    }
}

/// The `type` attribute of an input, as far as validation cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    Text,
    Password,
    Email,
    Url,
    Tel,
    Search,
    Number,
    Radio,
    Checkbox,
    Textarea,
    Select,
    #[serde(other)]
    Other,
}

impl InputType {
    /// Radio buttons and checkboxes legitimately share a name
    pub fn is_group(&self) -> bool {
        matches!(self, InputType::Radio | InputType::Checkbox)
    }
}

/// Copy of an input taken when a validation is triggered
///
/// A snapshot and not a live handle: the element may change again before an
/// async rule settles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSnapshot {
    pub name: String,

    #[serde(default, rename = "type")]
    pub input_type: InputType,

    #[serde(default)]
    pub value: String,

    #[serde(default)]
    pub validity: ValidityState,

    #[serde(default)]
    pub validation_message: String,
}

impl InputSnapshot {
    /// A text input holding `value` with no violation
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input_type: InputType::Text,
            value: value.into(),
            validity: ValidityState::valid(),
            validation_message: String::new(),
        }
    }

    pub fn with_type(mut self, input_type: InputType) -> Self {
        self.input_type = input_type;
        self
    }

    pub fn with_validity(mut self, validity: ValidityState, message: impl Into<String>) -> Self {
        self.validity = validity;
        self.validation_message = message.into();
        self
    }

    pub fn is_valid(&self) -> bool {
        self.validity.valid
    }
}
