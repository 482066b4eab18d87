//! String predicates

/// Length in characters, the unit HTML `minlength`/`maxlength` count in
pub fn char_count(s: &str) -> usize {
    s.chars().count()
}

pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Validates string length
pub fn validate_min_length(s: &str, min: usize) -> Result<(), String> {
    if char_count(s) >= min {
        Ok(())
    } else {
        Err(format!("Must be at least {} characters", min))
    }
}

pub fn validate_max_length(s: &str, max: usize) -> Result<(), String> {
    if char_count(s) <= max {
        Ok(())
    } else {
        Err(format!("Must be at most {} characters", max))
    }
}

pub fn validate_length(s: &str, min: usize, max: usize) -> Result<(), String> {
    let len = char_count(s);
    if len >= min && len <= max {
        Ok(())
    } else {
        Err(format!("Must be between {} and {} characters", min, max))
    }
}

/// Character class predicates
pub fn contains_digit(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}

pub fn contains_uppercase(s: &str) -> bool {
    s.chars().any(char::is_uppercase)
}

pub fn contains_lowercase(s: &str) -> bool {
    s.chars().any(char::is_lowercase)
}

/// Anything that is neither a letter, a digit nor whitespace
pub fn contains_special(s: &str) -> bool {
    s.chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
}

/// String matching predicates
pub fn contains(s: &str, substring: &str) -> bool {
    s.contains(substring)
}

pub fn not_contains(s: &str, substring: &str) -> bool {
    !s.contains(substring)
}

pub fn starts_with(s: &str, prefix: &str) -> bool {
    s.starts_with(prefix)
}

pub fn ends_with(s: &str, suffix: &str) -> bool {
    s.ends_with(suffix)
}

/// URL validation
///
/// Checks for an http/https scheme followed by a dotted host.
pub fn is_valid_url(url: &str) -> bool {
    let Some(after_protocol) = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
    else {
        return false;
    };

    let host = after_protocol.split(['/', '?', '#']).next().unwrap_or_default();

    !host.is_empty()
        && host.contains('.')
        && !host.starts_with('.')
        && !host.ends_with('.')
        && !host.chars().any(char::is_whitespace)
}

/// Regex search with a process-wide cache of compiled patterns
///
/// Invalid patterns never match.
#[cfg(feature = "regex-validation")]
pub fn matches_regex(value: &str, pattern: &str) -> bool {
    compiled(pattern).is_some_and(|regex| regex.is_match(value))
}

/// HTML `pattern` semantics: the whole value must match
///
/// Browsers ignore a `pattern` attribute that does not compile, so an invalid
/// pattern matches everything.
#[cfg(feature = "regex-validation")]
pub fn matches_pattern(value: &str, pattern: &str) -> bool {
    let anchored = format!("^(?:{})$", pattern);
    match compiled(&anchored) {
        Some(regex) => regex.is_match(value),
        None => true,
    }
}

#[cfg(feature = "regex-validation")]
fn compiled(pattern: &str) -> Option<regex::Regex> {
    use once_cell::sync::Lazy;
    use regex::Regex;
    use std::collections::HashMap;
    use std::sync::{Mutex, PoisonError};

    static REGEX_CACHE: Lazy<Mutex<HashMap<String, Regex>>> =
        Lazy::new(|| Mutex::new(HashMap::new()));

    let mut cache = REGEX_CACHE.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(regex) = cache.get(pattern) {
        return Some(regex.clone());
    }

    let regex = Regex::new(pattern).ok()?;
    cache.insert(pattern.to_string(), regex.clone());
    Some(regex)
}

#[cfg(not(feature = "regex-validation"))]
pub fn matches_regex(value: &str, pattern: &str) -> bool {
    // Without the regex crate pattern checks are left to the server
    let _ = (value, pattern);
    true
}

#[cfg(not(feature = "regex-validation"))]
pub fn matches_pattern(value: &str, pattern: &str) -> bool {
    let _ = (value, pattern);
    true
}

/// Equality predicates
pub fn equals(value: &str, expected: &str) -> bool {
    value == expected
}

pub fn not_equals(value: &str, forbidden: &str) -> bool {
    value != forbidden
}

/// Enum/value restriction
pub fn is_one_of(value: &str, allowed: &[&str]) -> bool {
    allowed.contains(&value)
}
