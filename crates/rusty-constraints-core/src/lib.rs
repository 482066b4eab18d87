// File: rusty-constraints-core/src/lib.rs
// Purpose: Main entry point for the validation core

//! # rusty-constraints-core
//!
//! Field-level feedback for forms: every input gets one or more ordered groups
//! of feedback rules (errors, warnings, infos, async checks) and the form
//! coordinator decides, on each change or submit, which rules fire.
//!
//! ```rust,ignore
//! use rusty_constraints_core::*;
//!
//! let inputs = Arc::new(FormInputs::new());
//! inputs.insert_with_constraints("username", InputType::Text, Html5Constraints::new().required());
//! let form = FormWithConstraints::new(inputs.clone());
//!
//! let group = FieldFeedbacks::for_field(&form, "username", StopPolicy::FirstError)?;
//! let required = FieldFeedback::mount(&group, FieldFeedbackProps::new(When::Constraint(Constraint::ValueMissing)))?;
//!
//! form.validate_fields(&["username".into()]).await?;
//! assert!(!form.is_valid());
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod async_feedback;
pub mod config;
pub mod error;
pub mod field;
pub mod field_feedback;
pub mod field_feedbacks;
pub mod fields_store;
pub mod form;
pub mod html5;
pub mod input;
pub mod inputs;
pub mod key;

// Re-export main types
pub use async_feedback::{AsyncFeedback, AsyncProps, AsyncStatus};
pub use config::FormConfig;
pub use error::{ConfigError, FormError};
pub use field::{FeedbackKind, Field, FieldValidation, Fired};
pub use field_feedback::{FieldFeedback, FieldFeedbackProps, Predicate, Severity, When};
pub use field_feedbacks::{FieldFeedbacks, FieldFeedbacksProps, StopPolicy};
pub use fields_store::{FieldsStore, FieldsStoreEvent, FieldsStoreListener};
pub use form::{FieldLifecycle, FieldListener, FormWithConstraints, ValidateEmitter, ValidateListener};
pub use html5::Html5Constraints;
pub use input::{Constraint, InputSnapshot, InputType, ValidityState};
pub use inputs::{FormInputs, InputSource, Selector};
pub use key::{FeedbackKey, KeyRegistry};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
