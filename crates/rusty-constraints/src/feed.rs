// File: rusty-constraints/src/feed.rs
// Purpose: Serializable outcome feed for presentation layers

use anyhow::{Context, Result};
use rusty_constraints_core::{Field, FieldValidation, FormWithConstraints};
use serde::{Deserialize, Serialize};

/// Outcomes of one field, as handed to a renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFeed {
    pub name: String,
    pub validations: Vec<FieldValidation>,
    /// Browser message of the last validated input, used as fallback text
    pub validation_message: String,
    pub is_valid: bool,
}

impl From<&Field> for FieldFeed {
    fn from(field: &Field) -> Self {
        Self {
            name: field.name().to_string(),
            validations: field.validations().to_vec(),
            validation_message: field
                .element()
                .map(|element| element.validation_message.clone())
                .unwrap_or_default(),
            is_valid: field.is_valid(),
        }
    }
}

/// Snapshot of every field of a form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeFeed {
    pub fields: Vec<FieldFeed>,
    pub is_valid: bool,
    pub has_feedbacks: bool,
}

impl OutcomeFeed {
    pub fn from_form(form: &FormWithConstraints) -> Self {
        let fields: Vec<FieldFeed> = form.fields().iter().map(FieldFeed::from).collect();
        Self {
            is_valid: fields.iter().all(|f| f.is_valid),
            has_feedbacks: form.has_feedbacks(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldFeed> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize outcome feed")
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize outcome feed")
    }
}
