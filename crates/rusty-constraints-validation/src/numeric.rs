//! Numeric predicates

/// Parse a form value as a number, the way `<input type="number">` reads it
///
/// Empty and non-finite values yield `None`.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Validates minimum value for numeric types
pub fn validate_min<T: PartialOrd + std::fmt::Display>(value: T, min: T) -> Result<(), String> {
    if value >= min {
        Ok(())
    } else {
        Err(format!("Must be at least {}", min))
    }
}

/// Validates maximum value for numeric types
pub fn validate_max<T: PartialOrd + std::fmt::Display>(value: T, max: T) -> Result<(), String> {
    if value <= max {
        Ok(())
    } else {
        Err(format!("Must be at most {}", max))
    }
}

/// Validates value is within range
pub fn validate_range<T: PartialOrd + std::fmt::Display>(
    value: T,
    min: T,
    max: T,
) -> Result<(), String> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(format!("Must be between {} and {}", min, max))
    }
}

/// Whether `value` sits on the step grid starting at `base`
pub fn is_step_aligned(value: f64, base: f64, step: f64) -> bool {
    if step <= 0.0 {
        return true;
    }
    let steps = (value - base) / step;
    (steps - steps.round()).abs() < 1e-9
}
