//! Address - Type-safe participant addresses
//!
//! Wallets, identities, policy modules, compliance instances and the asset
//! itself are all addressed the same way. The zero address stands for "nobody"
//! and marks issuance (`from` is zero) and retirement (`to` is zero).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum accepted length of an address string
const MAX_LEN: usize = 128;

/// Canonical spelling of the zero address
const ZERO: &str = "0x0";

/// Errors that can occur when parsing addresses
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Empty address")]
    Empty,

    #[error("Address too long (max {MAX_LEN} chars): {0}")]
    TooLong(String),

    #[error("Invalid address format: {0}")]
    InvalidFormat(String),
}

/// An opaque participant address
///
/// # Examples
/// ```
/// use tollgate_core::Address;
///
/// let alice: Address = "alice".parse().unwrap();
/// assert_eq!(alice.to_string(), "alice");
/// assert!(!alice.is_zero());
///
/// assert!(Address::zero().is_zero());
/// assert!("has space".parse::<Address>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and validate an address
    pub fn new(value: impl AsRef<str>) -> Result<Self, AddressError> {
        value.as_ref().parse()
    }

    /// The zero address (issuance source / retirement sink)
    pub fn zero() -> Self {
        Self(ZERO.to_string())
    }

    /// Check if this is the zero address
    pub fn is_zero(&self) -> bool {
        self.0 == ZERO
    }

    /// Returns the address as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.is_empty() {
            return Err(AddressError::Empty);
        }

        if s.len() > MAX_LEN {
            return Err(AddressError::TooLong(s.to_string()));
        }

        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
        {
            return Err(AddressError::InvalidFormat(s.to_string()));
        }

        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        let addr: Address = "wallet:alice".parse().unwrap();
        assert_eq!(addr.as_str(), "wallet:alice");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let addr: Address = "  bob  ".parse().unwrap();
        assert_eq!(addr.as_str(), "bob");
    }

    #[test]
    fn test_zero_address() {
        let zero = Address::zero();
        assert!(zero.is_zero());
        assert_eq!(zero, "0x0".parse().unwrap());
        assert!(!Address::new("0x1").unwrap().is_zero());
    }

    #[test]
    fn test_empty_error() {
        assert!(matches!(Address::new("   "), Err(AddressError::Empty)));
    }

    #[test]
    fn test_too_long_error() {
        let long = "a".repeat(MAX_LEN + 1);
        assert!(matches!(Address::new(long), Err(AddressError::TooLong(_))));
    }

    #[test]
    fn test_invalid_format_error() {
        assert!(matches!(
            Address::new("alice bob"),
            Err(AddressError::InvalidFormat(_))
        ));
        assert!(matches!(
            Address::new("alice/bob"),
            Err(AddressError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_serde_rejects_invalid() {
        let parsed: Result<Address, _> = serde_json::from_str("\"not valid\"");
        assert!(parsed.is_err());

        let json = serde_json::to_string(&Address::new("carol").unwrap()).unwrap();
        assert_eq!(json, "\"carol\"");
    }
}
