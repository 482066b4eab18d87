// File: rusty-constraints-core/src/error.rs
// Purpose: Declaration and selector errors

use rusty_constraints_events::EmitterError;

use crate::field_feedback::Severity;

/// Mistakes in how rules and groups are declared. These fail the offending
/// constructor immediately.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid feedback 'when' value '{when}': expected a predicate, '*', 'valid' or a constraint name")]
    UnrecognizedWhen { when: String },

    #[error("unknown constraint '{name}'")]
    UnknownConstraint { name: String },

    #[error("a feedback with when=\"valid\" cannot also be declared as {severity}")]
    WhenValidWithSeverity { severity: Severity },

    #[error("nested feedback group cannot target its own field '{field}'")]
    NestedGroupWithTarget { field: String },

    #[error("feedback group needs either a target field or a parent group")]
    GroupWithoutTarget,

    #[error("parent feedback group belongs to another form")]
    ForeignParent,

    #[error("unknown stop policy '{value}'")]
    UnknownStopPolicy { value: String },

    #[error("invalid feedback key '{value}'")]
    InvalidKey { value: String },

    #[error(transparent)]
    Emitter(#[from] EmitterError),
}

/// Errors raised by the form coordinator, mostly while resolving which inputs
/// a validation or reset targets
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("could not find field '[name=\"{name}\"]' inside the form")]
    InputNotFound { name: String },

    #[error("multiple elements matching '[name=\"{name}\"]' inside the form")]
    MultipleInputs { name: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Emitter(#[from] EmitterError),
}
