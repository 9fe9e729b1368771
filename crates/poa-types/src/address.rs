//! 20-byte account addresses.
//!
//! Addresses render as `0x`-prefixed lowercase hex and serialize in that
//! string form, so config files, JSON payloads and the SQLite event log all
//! carry the same representation.

use std::fmt;
use std::str::FromStr;

use serde_with::{DeserializeFromStr, SerializeDisplay};

/// Length of an address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Errors from parsing an address string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// Missing `0x` prefix.
    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),

    /// Wrong number of hex digits.
    #[error("address must be {expected} hex digits, got {actual}")]
    InvalidLength {
        /// Expected digit count.
        expected: usize,
        /// Actual digit count.
        actual: usize,
    },

    /// Non-hex characters.
    #[error("invalid hex in address: {0}")]
    InvalidHex(String),
}

/// An account identifier on the PoA chain.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    /// Build an address whose last byte is `n` and all others zero.
    ///
    /// Handy for fixtures: `Address::from_low_u64(7)` renders as
    /// `0x0000000000000000000000000000000000000007`.
    pub fn from_low_u64(n: u64) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[ADDRESS_LEN - 8..].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }

    /// Whether this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(s.to_string()))?;

        if digits.len() != ADDRESS_LEN * 2 {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_LEN * 2,
                actual: digits.len(),
            });
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let s = "0x00000000000000000000000000000000000000ab";
        let addr: Address = s.parse().expect("parse");
        assert_eq!(addr, Address::from_low_u64(0xab));
        assert_eq!(addr.to_string(), s);
    }

    #[test]
    fn test_parse_uppercase_hex() {
        let addr: Address = "0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFE"
            .parse()
            .expect("parse");
        assert_eq!(addr, crate::SYSTEM_ADDRESS);
    }

    #[test]
    fn test_missing_prefix() {
        let result = "00000000000000000000000000000000000000ab".parse::<Address>();
        assert!(matches!(result, Err(AddressError::MissingPrefix(_))));
    }

    #[test]
    fn test_wrong_length() {
        let result = "0xabcd".parse::<Address>();
        assert_eq!(
            result,
            Err(AddressError::InvalidLength {
                expected: 40,
                actual: 4
            })
        );
    }

    #[test]
    fn test_invalid_hex() {
        let result = "0x00000000000000000000000000000000000000zz".parse::<Address>();
        assert!(matches!(result, Err(AddressError::InvalidHex(_))));
    }

    #[test]
    fn test_zero() {
        assert!(Address::ZERO.is_zero());
        assert!(Address::default().is_zero());
        assert!(!Address::from_low_u64(1).is_zero());
    }

    #[test]
    fn test_serde_string_form() {
        let addr = Address::from_low_u64(5);
        let json = serde_json::to_string(&addr).expect("serialize");
        assert_eq!(json, "\"0x0000000000000000000000000000000000000005\"");
        let back: Address = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, addr);
    }
}
