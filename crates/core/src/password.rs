//! Password strength policy.
//!
//! Every plaintext password is checked against five rules before it is
//! hashed. Failures report every broken rule, in a fixed order, so clients
//! can show them all at once.

use core::fmt;

/// Minimum number of characters in a password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Characters that satisfy the special-character rule.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*(),.?\":{}|<>[]~/'";

/// A single broken password rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasswordViolation {
    TooShort,
    MissingLowercase,
    MissingUppercase,
    MissingDigit,
    MissingSymbol,
}

impl PasswordViolation {
    /// Message shown to API clients.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::TooShort => "Password must be at least 8 characters.",
            Self::MissingLowercase => "Password must contain at least one lowercase letter.",
            Self::MissingUppercase => "Password must contain at least one uppercase letter.",
            Self::MissingDigit => "Password must contain at least one number.",
            Self::MissingSymbol => "Password must contain at least one special character.",
        }
    }
}

impl fmt::Display for PasswordViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A password that broke one or more rules.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("password does not meet the strength policy ({} rule(s) violated)", .violations.len())]
pub struct PasswordPolicyError {
    violations: Vec<PasswordViolation>,
}

impl PasswordPolicyError {
    /// Broken rules, in rule order. Never empty.
    #[must_use]
    pub fn violations(&self) -> &[PasswordViolation] {
        &self.violations
    }

    /// Client-facing messages for each broken rule.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.violations
            .iter()
            .map(|v| v.message().to_owned())
            .collect()
    }
}

/// Check a plaintext password against the strength policy.
///
/// ```
/// use stockroom_core::{PasswordViolation, validate_password_strength};
///
/// assert!(validate_password_strength("Str0ng!pass").is_ok());
///
/// let err = validate_password_strength("weak").unwrap_err();
/// assert_eq!(err.violations()[0], PasswordViolation::TooShort);
/// ```
///
/// # Errors
///
/// Returns `PasswordPolicyError` listing every violated rule.
pub fn validate_password_strength(password: &str) -> Result<(), PasswordPolicyError> {
    let mut violations = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        violations.push(PasswordViolation::TooShort);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        violations.push(PasswordViolation::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        violations.push(PasswordViolation::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        violations.push(PasswordViolation::MissingDigit);
    }
    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        violations.push(PasswordViolation::MissingSymbol);
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(PasswordPolicyError { violations })
    }
}
