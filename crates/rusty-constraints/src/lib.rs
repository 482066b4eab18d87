// File: rusty-constraints/src/lib.rs
// Purpose: Facade re-exporting the engine, form declarations, outcome feed and logging setup

//! # rusty-constraints
//!
//! Field-level feedback for forms, in the spirit of HTML5 constraint validation:
//! each input gets ordered groups of rules (errors, warnings, infos, async
//! checks), a stop policy decides how far a group evaluates, and the form
//! coordinator drives validation passes and keeps every outcome in one store.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rusty_constraints::*;
//! use std::sync::Arc;
//!
//! let inputs = Arc::new(FormInputs::new());
//! inputs.insert_with_constraints(
//!     "password",
//!     InputType::Password,
//!     Html5Constraints::new().required().pattern(".{5,}"),
//! );
//! let form = FormWithConstraints::new(inputs.clone());
//!
//! let group = FieldFeedbacks::for_field(&form, "password", StopPolicy::No)?;
//! let _missing = FieldFeedback::mount(&group, FieldFeedbackProps::new(Constraint::ValueMissing))?;
//! let _digits = FieldFeedback::mount(
//!     &group,
//!     FieldFeedbackProps::predicate(|v| !validation::contains_digit(v)).warning(),
//! )?;
//!
//! inputs.set_value("password", "secret");
//! form.validate_fields(&["password".into()]).await?;
//! assert!(form.is_valid());
//! ```
//!
//! Rules can also be declared in TOML, see [`declaration`].
//!
//! ## Features
//!
//! - **`validation`** (default) - Include the predicate library as [`validation`]
//! - **`full`** - All features enabled
//!
//! ## Architecture
//!
//! This crate is a convenience wrapper over the component crates:
//!
//! - **`rusty-constraints-events`** - Named-event emitter with sync and sequential async emission
//! - **`rusty-constraints-core`** - Fields, rules, rule groups, async rules and the form coordinator
//! - **`rusty-constraints-validation`** - String, email, numeric and password predicates

#![doc(html_root_url = "https://docs.rs/rusty-constraints/0.1.0")]

pub mod declaration;
pub mod feed;
pub mod logging;

// Re-export the engine
pub use rusty_constraints_core::*;

// Re-export the emitter
pub use rusty_constraints_events as events;

// Re-export validation module (if feature enabled)
#[cfg(feature = "validation")]
pub use rusty_constraints_validation as validation;

pub use declaration::{mount_declaration, FieldDeclaration, FormDeclaration, MountedForm, RuleDeclaration};
pub use feed::{FieldFeed, OutcomeFeed};
