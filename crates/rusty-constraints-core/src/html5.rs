// File: rusty-constraints-core/src/html5.rs
// Purpose: Compute validity flags from HTML5 constraint attributes

use rusty_constraints_validation::{
    char_count, is_step_aligned, is_valid_email, is_valid_url, matches_pattern, parse_number,
};
use serde::{Deserialize, Serialize};

use crate::input::{Constraint, InputType, ValidityState};

/// HTML5 constraint attributes of one input
///
/// Outside a browser nobody computes `ValidityState` for us; this produces
/// the same flags (and a browser-like message) from the attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Html5Constraints {
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
}

impl Html5Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    /// Check a value, returning the validity flags and the message a browser
    /// would show for the first violation (empty when valid)
    pub fn check(&self, input_type: InputType, value: &str) -> (ValidityState, String) {
        let mut validity = ValidityState::valid();
        let mut messages = Vec::new();

        // Empty values only ever violate `required`
        if value.is_empty() {
            if self.required {
                validity.set(Constraint::ValueMissing);
                messages.push(match input_type {
                    InputType::Checkbox => "Please check this box if you want to proceed.".to_string(),
                    InputType::Radio => "Please select one of these options.".to_string(),
                    _ => "Please fill out this field.".to_string(),
                });
            }
            return (validity, messages.into_iter().next().unwrap_or_default());
        }

        match input_type {
            InputType::Email if !is_valid_email(value) => {
                validity.set(Constraint::TypeMismatch);
                messages.push(format!("Please enter an email address ('{}' is not one).", value));
            }
            InputType::Url if !is_valid_url(value) => {
                validity.set(Constraint::TypeMismatch);
                messages.push("Please enter a URL.".to_string());
            }
            InputType::Number => self.check_number(value, &mut validity, &mut messages),
            _ => {}
        }

        let len = char_count(value);
        if let Some(min) = self.min_length.filter(|min| len < *min) {
            validity.set(Constraint::TooShort);
            messages.push(format!(
                "Please lengthen this text to {} characters or more (you are currently using {} characters).",
                min, len
            ));
        }
        if let Some(max) = self.max_length.filter(|max| len > *max) {
            validity.set(Constraint::TooLong);
            messages.push(format!(
                "Please shorten this text to {} characters or less (you are currently using {} characters).",
                max, len
            ));
        }

        if input_type != InputType::Number {
            if let Some(pattern) = &self.pattern {
                if !matches_pattern(value, pattern) {
                    validity.set(Constraint::PatternMismatch);
                    messages.push("Please match the requested format.".to_string());
                }
            }
        }

        (validity, messages.into_iter().next().unwrap_or_default())
    }

    fn check_number(&self, value: &str, validity: &mut ValidityState, messages: &mut Vec<String>) {
        let Some(number) = parse_number(value) else {
            validity.set(Constraint::BadInput);
            messages.push("Please enter a number.".to_string());
            return;
        };

        if let Some(min) = self.min.filter(|min| number < *min) {
            validity.set(Constraint::RangeUnderflow);
            messages.push(format!("Value must be greater than or equal to {}.", min));
        }
        if let Some(max) = self.max.filter(|max| number > *max) {
            validity.set(Constraint::RangeOverflow);
            messages.push(format!("Value must be less than or equal to {}.", max));
        }
        if let Some(step) = self.step {
            if !is_step_aligned(number, self.min.unwrap_or(0.0), step) {
                validity.set(Constraint::StepMismatch);
                messages.push("Please enter a valid value.".to_string());
            }
        }
    }
}
