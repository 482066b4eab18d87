//! Password strength predicates

use crate::string::{
    char_count, contains_digit, contains_lowercase, contains_special, contains_uppercase,
};

/// Password strength tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordPattern {
    /// 6+ characters minimum
    Basic,
    /// 8+ chars with uppercase, lowercase, and digit
    Medium,
    /// 8+ chars with uppercase, lowercase, digit, and special character
    Strong,
}

impl PasswordPattern {
    /// Parse a password tier name
    ///
    /// # Examples
    /// ```
    /// use rusty_constraints_validation::password::PasswordPattern;
    /// assert_eq!(PasswordPattern::parse("basic"), Some(PasswordPattern::Basic));
    /// assert_eq!(PasswordPattern::parse("strong"), Some(PasswordPattern::Strong));
    /// assert_eq!(PasswordPattern::parse("unknown"), None);
    /// ```
    pub fn parse(pattern: &str) -> Option<Self> {
        match pattern {
            "basic" => Some(PasswordPattern::Basic),
            "medium" => Some(PasswordPattern::Medium),
            "strong" => Some(PasswordPattern::Strong),
            _ => None,
        }
    }
}

/// Validates a password against a tier, returning the first unmet requirement
pub fn validate_password(password: &str, pattern: PasswordPattern) -> Result<(), String> {
    let len = char_count(password);

    let checks: Vec<(bool, &str)> = match pattern {
        PasswordPattern::Basic => vec![(len >= 6, "Password must be at least 6 characters")],
        PasswordPattern::Medium => vec![
            (len >= 8, "Password must be at least 8 characters"),
            (contains_uppercase(password), "Password must contain uppercase letter"),
            (contains_lowercase(password), "Password must contain lowercase letter"),
            (contains_digit(password), "Password must contain digit"),
        ],
        PasswordPattern::Strong => vec![
            (len >= 8, "Password must be at least 8 characters"),
            (contains_uppercase(password), "Password must contain at least one uppercase letter"),
            (contains_lowercase(password), "Password must contain at least one lowercase letter"),
            (contains_digit(password), "Password must contain at least one digit"),
            (contains_special(password), "Password must contain at least one special character"),
        ],
    };

    checks
        .iter()
        .find(|(valid, _)| !valid)
        .map(|(_, msg)| Err(msg.to_string()))
        .unwrap_or(Ok(()))
}

/// Predicate form, handy as a `when` function: fires when the password is too weak
pub fn is_weak_password(password: &str, pattern: PasswordPattern) -> bool {
    validate_password(password, pattern).is_err()
}
