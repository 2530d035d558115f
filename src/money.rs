//! Money parsing module
//!
//! Every amount that enters the ledger goes through this module. Request
//! bodies are loosely typed (the web UI posts JSON numbers, scripts post
//! strings), so parsing is an explicit step that yields either a typed
//! [`Amount`] or a [`MoneyError`], before any store is touched.
//!
//! ## Accepted input
//! - JSON number: `100`, `50.25`
//! - JSON string: `"100"`, `"0.5"` (strict format, see [`parse_decimal_str`])
//!
//! ## Usage
//! ```
//! use bank_ledger::money::Amount;
//! use serde_json::json;
//!
//! let amount = Amount::from_json(Some(&json!("12.50"))).unwrap();
//! assert_eq!(amount.to_string(), "12.5");
//! assert!(Amount::from_json(Some(&json!(0))).is_err());
//! ```

use rust_decimal::prelude::*;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Money parsing errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Amount is required")]
    Missing,

    #[error("Amount must be greater than zero")]
    NotPositive,

    #[error("Amount cannot be negative")]
    Negative,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Amount {amount} would overflow balance {balance}")]
    Overflow { balance: Decimal, amount: Decimal },
}

// ============================================================================
// Amount: strictly positive decimal
// ============================================================================

/// Validated transaction amount, guaranteed `> 0`.
///
/// The field is private to force validation through [`Amount::new`] or the
/// parse functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Create a validated amount. Trailing zeros are normalized away.
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        if value <= Decimal::ZERO {
            return Err(MoneyError::NotPositive);
        }
        Ok(Self(value.normalize()))
    }

    /// Parse an amount out of a request body field.
    ///
    /// `None` and JSON `null` are [`MoneyError::Missing`].
    pub fn from_json(value: Option<&Value>) -> Result<Self, MoneyError> {
        match value {
            None | Some(Value::Null) => Err(MoneyError::Missing),
            Some(v) => Self::new(parse_decimal(v)?),
        }
    }

    /// Get the inner Decimal value
    pub fn value(self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl std::str::FromStr for Amount {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::new(parse_decimal_str(s)?)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Serialize as string to preserve precision
        serializer.serialize_str(&self.0.to_string())
    }
}

// ============================================================================
// Opening balances
// ============================================================================

/// Parse an opening balance for a new account.
///
/// Absent or `null` means zero. Zero is allowed, negatives are not.
pub fn parse_opening_balance(value: Option<&Value>) -> Result<Decimal, MoneyError> {
    match value {
        None | Some(Value::Null) => Ok(Decimal::ZERO),
        Some(v) => {
            let d = parse_decimal(v)?;
            if d.is_sign_negative() && !d.is_zero() {
                return Err(MoneyError::Negative);
            }
            Ok(d.normalize())
        }
    }
}

// ============================================================================
// Parse helpers
// ============================================================================

/// Parse a JSON number or numeric string into a Decimal (sign preserved).
pub fn parse_decimal(value: &Value) -> Result<Decimal, MoneyError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(Decimal::from(i));
            }
            if let Some(u) = n.as_u64() {
                return Ok(Decimal::from(u));
            }
            // Number keeps the request text (arbitrary_precision), so
            // digits beyond what Decimal holds are an error, not rounding
            let repr = n.to_string();
            if repr.contains(['e', 'E']) {
                return Decimal::from_scientific(&repr)
                    .map_err(|_| MoneyError::InvalidFormat(format!("number out of range: {}", repr)));
            }
            exact(&repr)
        }
        Value::String(s) => parse_decimal_str(s),
        Value::Null => Err(MoneyError::Missing),
        _ => Err(MoneyError::InvalidFormat(
            "expected a number or numeric string".into(),
        )),
    }
}

/// Parse a decimal string with strict format rules.
///
/// - Rejects empty strings
/// - Rejects `.5` (must be `0.5`) and `5.` (must be `5` or `5.0`)
/// - Rejects scientific notation and a `+` prefix
pub fn parse_decimal_str(s: &str) -> Result<Decimal, MoneyError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(MoneyError::InvalidFormat("empty string".into()));
    }
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    if unsigned.starts_with('.') {
        return Err(MoneyError::InvalidFormat(
            "missing leading zero (e.g., use 0.5 instead of .5)".into(),
        ));
    }
    if unsigned.ends_with('.') {
        return Err(MoneyError::InvalidFormat(
            "missing fractional part (e.g., use 5.0 instead of 5.)".into(),
        ));
    }
    if s.contains('e') || s.contains('E') {
        return Err(MoneyError::InvalidFormat(
            "scientific notation not allowed".into(),
        ));
    }
    if s.starts_with('+') {
        return Err(MoneyError::InvalidFormat("+ prefix not allowed".into()));
    }
    if !unsigned.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(MoneyError::InvalidFormat(format!("not a decimal: {}", s)));
    }
    exact(s)
}

fn exact(s: &str) -> Result<Decimal, MoneyError> {
    Decimal::from_str_exact(s)
        .map_err(|e| MoneyError::InvalidFormat(format!("{}: {}", s, e)))
}
