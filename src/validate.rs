//! Email syntax check.

use regex::Regex;
use std::sync::LazyLock;

// local-part "@" one or more dot-terminated labels, then an alphabetic tld
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@(?:[A-Za-z0-9-]+\.)+[A-Za-z]{2,}$")
        .expect("email pattern is a valid regex")
});

/// Outcome of validating a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Verified,
    Invalid,
}

impl Validation {
    pub fn of(email: &str) -> Self {
        if validate_email(email) {
            Validation::Verified
        } else {
            Validation::Invalid
        }
    }
}

/// Returns true iff `email` is syntactically `local@domain.tld`.
///
/// No DNS or deliverability checks are made.
pub fn validate_email(email: &str) -> bool {
    EMAIL.is_match(email)
}
