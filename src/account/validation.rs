//! Input validation for account names
//!
//! All fields are private to force validation through the public API.

use std::fmt;

// ============================================================================
// Validation Errors
// ============================================================================

/// Validation errors for account input
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid length for {field}: expected {min}-{max}, got {actual}")]
    InvalidLength {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("Invalid format for {field}: control characters are not allowed")]
    ControlCharacters { field: &'static str },
}

// ============================================================================
// AccountName - Validated Account Name (Private Fields)
// ============================================================================

/// Maximum length of `accounts.name` (VARCHAR(200))
pub const MAX_ACCOUNT_NAME_LEN: usize = 200;

/// Validated account holder name
///
/// Fields are private to force validation through `new()`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountName(String);

impl AccountName {
    /// Create a new validated AccountName
    ///
    /// # Validation Rules
    /// - Surrounding whitespace is trimmed
    /// - Length: 1-200 characters after trimming
    /// - No control characters
    ///
    /// # Examples
    /// ```
    /// use bank_ledger::account::validation::AccountName;
    ///
    /// let name = AccountName::new("  Savings ").unwrap();
    /// assert_eq!(name.as_str(), "Savings");
    ///
    /// assert!(AccountName::new("   ").is_err());
    /// ```
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        let len = name.chars().count();

        if len == 0 || len > MAX_ACCOUNT_NAME_LEN {
            return Err(ValidationError::InvalidLength {
                field: "name",
                min: 1,
                max: MAX_ACCOUNT_NAME_LEN,
                actual: len,
            });
        }

        if name.chars().any(char::is_control) {
            return Err(ValidationError::ControlCharacters { field: "name" });
        }

        Ok(Self(name.to_string()))
    }

    /// Get the validated name as &str
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AccountName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
