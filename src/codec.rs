//! Hex quantity codec for node wire values.
//!
//! The node encodes every numeric field as a `0x`-prefixed base-16 string.

use num_bigint::BigUint;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("hex string should have 0x prefix: {0:?}")]
    MissingPrefix(String),

    #[error("invalid hex digits: {0:?}")]
    InvalidDigits(String),
}

/// Decode a `0x`-prefixed hex string into an arbitrary-precision integer.
pub fn decode(hex: &str) -> Result<BigUint, FormatError> {
    let digits = hex
        .strip_prefix("0x")
        .ok_or_else(|| FormatError::MissingPrefix(hex.to_string()))?;

    // parse_bytes tolerates '_' and a leading '+'; the wire format does not.
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(FormatError::InvalidDigits(digits.to_string()));
    }

    BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| FormatError::InvalidDigits(digits.to_string()))
}

/// Render an integer as a lowercase `0x`-prefixed hex string.
pub fn encode(value: &BigUint) -> String {
    format!("0x{:x}", value)
}

/// Convenience for block heights, which always fit in a `u64`.
pub fn encode_u64(value: u64) -> String {
    format!("0x{:x}", value)
}

/// Serde adapter storing `BigUint` fields as hex quantities.
pub mod serde_hex {
    use super::{decode, encode};
    use num_bigint::BigUint;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let s = String::deserialize(deserializer)?;
        decode(&s).map_err(D::Error::custom)
    }
}
