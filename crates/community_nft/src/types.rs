//! Types for the community NFT ledger

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a token slot inside a community ledger.
pub type TokenId = u64;

/// Token quantity.
pub type Amount = u128;

/// Reserved token id representing community membership.
///
/// Only the dedicated membership paths may mint it.
pub const MEMBERSHIP_TOKEN_ID: TokenId = 1;

/// Default cap on the number of recipients accepted by a single airdrop.
pub const DEFAULT_MAX_AIRDROP_RECIPIENTS: usize = 500;

/// Number of raw bytes contained in an address.
pub const ADDRESS_BYTES: usize = 32;
/// Expected string length of an encoded address (`0x` + 64 hex chars).
pub const ADDRESS_STRING_LENGTH: usize = 2 + ADDRESS_BYTES * 2;

/// Errors that can occur when parsing an address string.
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("address must start with '0x'")]
    InvalidPrefix,
    #[error("address must be {expected} characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("address payload is not valid hexadecimal")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("address payload must be exactly 32 bytes")]
    InvalidPayloadLength,
}

/// A principal: account holder, owner, relayer or a deployed ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; ADDRESS_BYTES]);

impl Address {
    /// The null principal. Nothing can be minted to it.
    pub const ZERO: Address = Address([0u8; ADDRESS_BYTES]);

    pub fn new(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_BYTES] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Encode into the `0x`-prefixed lowercase hex form.
    pub fn encode(&self) -> String {
        let mut encoded = String::with_capacity(ADDRESS_STRING_LENGTH);
        encoded.push_str("0x");
        encoded.push_str(&hex::encode(self.0));
        encoded
    }

    /// Decode a `0x`-prefixed hex string.
    pub fn decode(address: &str) -> Result<Self, AddressError> {
        let Some(payload) = address.strip_prefix("0x") else {
            return Err(AddressError::InvalidPrefix);
        };

        if address.len() != ADDRESS_STRING_LENGTH {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_STRING_LENGTH,
                actual: address.len(),
            });
        }

        let bytes: [u8; ADDRESS_BYTES] = hex::decode(payload)?
            .try_into()
            .map_err(|_| AddressError::InvalidPayloadLength)?;

        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl std::str::FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl From<[u8; ADDRESS_BYTES]> for Address {
    fn from(value: [u8; ADDRESS_BYTES]) -> Self {
        Address(value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.encode()
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::decode(&value)
    }
}

/// Which authorization rule a rejected caller failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthRule {
    /// Caller must be the owner or the relayer.
    OwnerOrRelayer,
    /// Caller must be the owner.
    OwnerOnly,
}

impl fmt::Display for AuthRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthRule::OwnerOrRelayer => f.write_str("Only owner or relayer can mint"),
            AuthRule::OwnerOnly => f.write_str("Ownable: caller is not the owner"),
        }
    }
}

/// Operational limits applied to a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLimits {
    /// Largest recipient list accepted by `airdrop_membership`.
    pub max_airdrop_recipients: usize,
}

impl Default for LedgerLimits {
    fn default() -> Self {
        Self {
            max_airdrop_recipients: DEFAULT_MAX_AIRDROP_RECIPIENTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_has_prefix_and_length() {
        let encoded = Address::new([0xAB; ADDRESS_BYTES]).encode();
        assert!(encoded.starts_with("0x"));
        assert_eq!(encoded.len(), ADDRESS_STRING_LENGTH);
        assert_eq!(Address::decode(&encoded).unwrap(), Address::new([0xAB; 32]));
    }

    #[test]
    fn invalid_prefix_rejected() {
        let bad = "1x".to_string() + &"00".repeat(ADDRESS_BYTES);
        assert!(matches!(
            Address::decode(&bad).unwrap_err(),
            AddressError::InvalidPrefix
        ));
    }

    #[test]
    fn invalid_length_rejected() {
        let bad = "0x".to_string() + &"00".repeat(ADDRESS_BYTES - 1);
        assert!(matches!(
            Address::decode(&bad).unwrap_err(),
            AddressError::InvalidLength { .. }
        ));
    }

    #[test]
    fn invalid_hex_rejected() {
        let bad = format!("0x{}", "zz".repeat(ADDRESS_BYTES));
        assert!(matches!(
            Address::decode(&bad).unwrap_err(),
            AddressError::InvalidHex(_)
        ));
    }

    #[test]
    fn address_serializes_as_string() {
        let addr = Address::new([7u8; 32]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.encode()));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn auth_rule_messages() {
        assert_eq!(
            AuthRule::OwnerOrRelayer.to_string(),
            "Only owner or relayer can mint"
        );
        assert_eq!(
            AuthRule::OwnerOnly.to_string(),
            "Ownable: caller is not the owner"
        );
    }

    #[test]
    fn zero_address() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::new([1u8; 32]).is_zero());
    }
}
