//! Email predicates

/// List of common public email domains
pub const PUBLIC_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "icloud.com",
    "aol.com",
    "mail.com",
    "protonmail.com",
    "yandex.com",
    "zoho.com",
];

/// Validates basic email format
///
/// Checks for:
/// - Exactly one '@' with content on both sides
/// - A dotted domain that does not start or end with '.' or '-'
/// - No consecutive dots, a TLD of at least 2 characters
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if domain.contains('@') {
        return false;
    }

    if local.is_empty() || local.len() > 64 {
        return false;
    }

    if domain.is_empty() || domain.len() > 255 || !domain.contains('.') {
        return false;
    }

    if domain.starts_with(['.', '-']) || domain.ends_with(['.', '-']) || domain.contains("..") {
        return false;
    }

    let valid_local_chars = |c: char| c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | '+');
    let valid_domain_chars = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-');

    if !local.chars().all(valid_local_chars) || !domain.chars().all(valid_domain_chars) {
        return false;
    }

    domain
        .rsplit('.')
        .next()
        .is_some_and(|tld| tld.chars().count() >= 2)
}

/// Checks if the email domain is a public provider (gmail, yahoo, etc.)
pub fn is_public_domain(email: &str) -> bool {
    email
        .split_once('@')
        .is_some_and(|(_, domain)| PUBLIC_DOMAINS.iter().any(|d| d.eq_ignore_ascii_case(domain)))
}

/// Checks if the email domain is in the blocked list
pub fn is_blocked_domain(email: &str, blocked: &[&str]) -> bool {
    email
        .split_once('@')
        .is_some_and(|(_, domain)| blocked.iter().any(|d| d.eq_ignore_ascii_case(domain)))
}
