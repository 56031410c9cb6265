//! Account identities and value amounts
//!
//! Every mutating operation receives the caller as an explicit [`Address`];
//! nothing is inferred from ambient state.

use crate::core::error::ContractError;
use crate::crypto::sha256_hex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value unit held by the ledger
pub type Amount = u128;

/// Canonical null address
pub const NULL_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Opaque account identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Wrap an identifier without validation
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The null address
    pub fn null() -> Self {
        Self(NULL_ADDRESS.to_string())
    }

    /// Derive a contract address from the given seed parts
    ///
    /// Produces `0x` followed by the first 40 hex chars of the SHA-256 of the
    /// colon-joined parts.
    pub fn derive(parts: &[&str]) -> Self {
        let digest = sha256_hex(parts.join(":").as_bytes());
        Self(format!("0x{}", &digest[..40]))
    }

    /// True for the empty identifier and the canonical zero address
    pub fn is_null(&self) -> bool {
        let trimmed = self.0.trim();
        trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NULL_ADDRESS)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Parse a decimal amount coming from user input
///
/// Zero, negative and malformed values are all rejected as invalid arguments.
pub fn parse_amount(input: &str) -> Result<Amount, ContractError> {
    let trimmed = input.trim();
    if trimmed.starts_with('-') {
        return Err(ContractError::InvalidArgument(format!(
            "amount must be positive, got {}",
            trimmed
        )));
    }

    let amount: Amount = trimmed.parse().map_err(|_| {
        ContractError::InvalidArgument(format!("amount is not a valid number: {:?}", trimmed))
    })?;

    if amount == 0 {
        return Err(ContractError::InvalidArgument(
            "amount must be greater than 0".to_string(),
        ));
    }

    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_address() {
        assert!(Address::null().is_null());
        assert!(Address::new("").is_null());
        assert!(Address::new("  ").is_null());
        assert!(!Address::new("alice").is_null());
    }

    #[test]
    fn test_derive_is_deterministic() {
        let a = Address::derive(&["owner", "recipient", "0"]);
        let b = Address::derive(&["owner", "recipient", "0"]);
        let c = Address::derive(&["owner", "recipient", "1"]);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.as_str().starts_with("0x"));
        assert_eq!(a.as_str().len(), 42);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("100").unwrap(), 100);
        assert_eq!(parse_amount(" 42 ").unwrap(), 42);

        assert!(matches!(
            parse_amount("0"),
            Err(ContractError::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_amount("-5"),
            Err(ContractError::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_amount("ten"),
            Err(ContractError::InvalidArgument(_))
        ));
    }
}
