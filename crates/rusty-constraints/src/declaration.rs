// File: rusty-constraints/src/declaration.rs
// Purpose: Declare inputs, rule groups and rules in TOML and mount them on a form

//! A declaration describes a whole form:
//!
//! ```toml
//! [form]
//! default_stop = "first-error"
//!
//! [[fields]]
//! name = "password"
//! type = "password"
//! stop = "no"
//!
//! [fields.constraints]
//! required = true
//! pattern = ".{5,}"
//!
//! [[fields.rules]]
//! when = "valueMissing"
//! message = "Password is required"
//!
//! [[fields.rules]]
//! when = "valid"
//! message = "Looks good!"
//! ```
//!
//! Rules can only use `*`, `valid` and constraint names; predicates are code
//! and are mounted with [`FieldFeedback::mount`].

use anyhow::{Context, Result};
use rusty_constraints_core::{
    ConfigError, FieldFeedback, FieldFeedbackProps, FieldFeedbacks, FieldFeedbacksProps, FormConfig,
    FormInputs, FormWithConstraints, Html5Constraints, InputSnapshot, InputSource, InputType, Severity,
    StopPolicy, When,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// A whole form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormDeclaration {
    #[serde(default)]
    pub form: FormConfig,

    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
}

/// One input and the top-level rule group targeting it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,

    #[serde(default, rename = "type")]
    pub input_type: InputType,

    /// Constraint attributes; without them the input is always valid
    #[serde(default)]
    pub constraints: Option<Html5Constraints>,

    /// Falls back to the form's default stop policy
    #[serde(default)]
    pub stop: Option<StopPolicy>,

    #[serde(default)]
    pub rules: Vec<RuleDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDeclaration {
    pub when: String,

    #[serde(default)]
    pub severity: Option<Severity>,

    #[serde(default)]
    pub message: Option<String>,
}

impl RuleDeclaration {
    pub fn props(&self) -> Result<FieldFeedbackProps, ConfigError> {
        let when: When = self.when.parse()?;
        let props = FieldFeedbackProps {
            when,
            severity: self.severity,
            message: self.message.clone(),
        };
        // Surface severity conflicts before anything is mounted
        props.kind()?;
        Ok(props)
    }
}

impl FormDeclaration {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        toml::from_str(content).context("Failed to parse form declaration")
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read form declaration: {:?}", path))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load form declaration: {:?}", path))
    }

    /// In-memory inputs matching the declared fields, all empty
    pub fn inputs(&self) -> FormInputs {
        let inputs = FormInputs::new();
        for field in &self.fields {
            match &field.constraints {
                Some(constraints) => {
                    inputs.insert_with_constraints(field.name.clone(), field.input_type, constraints.clone())
                }
                None => inputs.insert(InputSnapshot::new(field.name.clone(), "").with_type(field.input_type)),
            }
        }
        inputs
    }
}

/// A form with everything a declaration mounted on it
///
/// Groups and rules stay mounted for as long as this value lives.
#[derive(Debug)]
pub struct MountedForm {
    pub form: Arc<FormWithConstraints>,
    pub groups: Vec<Arc<FieldFeedbacks>>,
    pub rules: Vec<Arc<FieldFeedback>>,
}

impl MountedForm {
    /// Rules mounted for one field, in declaration order
    pub fn rules_for(&self, field: &str) -> Vec<&Arc<FieldFeedback>> {
        self.rules
            .iter()
            .filter(|rule| rule.group().field_name() == field)
            .collect()
    }
}

/// Mount a declaration on a new form reading from `inputs`
///
/// Every rule is checked before the first group is mounted, so a bad
/// declaration leaves nothing behind.
pub fn mount_declaration(
    declaration: &FormDeclaration,
    inputs: Arc<dyn InputSource>,
) -> Result<MountedForm, ConfigError> {
    let mut props = Vec::with_capacity(declaration.fields.len());
    for field in &declaration.fields {
        let field_props = field
            .rules
            .iter()
            .map(RuleDeclaration::props)
            .collect::<Result<Vec<_>, _>>()?;
        props.push(field_props);
    }

    let form = FormWithConstraints::with_config(inputs, declaration.form.clone());
    let mut groups = Vec::with_capacity(declaration.fields.len());
    let mut rules = Vec::new();

    for (field, field_props) in declaration.fields.iter().zip(props) {
        let group = FieldFeedbacks::mount(
            &form,
            None,
            FieldFeedbacksProps {
                for_field: Some(field.name.clone()),
                stop: field.stop,
            },
        )?;

        for rule_props in field_props {
            rules.push(FieldFeedback::mount(&group, rule_props)?);
        }
        groups.push(group);
    }

    tracing::debug!(
        "Mounted declaration: {} field(s), {} rule(s)",
        groups.len(),
        rules.len()
    );

    Ok(MountedForm { form, groups, rules })
}
