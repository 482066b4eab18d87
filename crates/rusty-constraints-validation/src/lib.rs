//! Rusty-Constraints-Validation
//!
//! Pure predicate functions over input values. They are meant to be used as
//! `when` predicates of feedback rules (`When::predicate(contains_digit)`) and
//! back the HTML5 constraint evaluator in `rusty-constraints-core`.

pub mod email;
pub mod numeric;
pub mod password;
pub mod string;

// Re-export all validators
pub use email::*;
pub use numeric::*;
pub use password::*;
pub use string::*;
