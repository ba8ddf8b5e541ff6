//! Error types for the community NFT ledger

use crate::types::{AuthRule, TokenId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommunityNftError {
    #[error("{rule}")]
    Unauthorized { rule: AuthRule },

    #[error("Membership NFT mint not allowed")]
    ReservedId { token_id: TokenId },

    #[error("Mint to the zero address")]
    InvalidRecipient,

    #[error("New owner is the zero address")]
    InvalidOwner,

    #[error("Balance overflow for token {token_id}")]
    Overflow { token_id: TokenId },

    #[error("Holders and ids length mismatch: {holders} holders, {ids} ids")]
    LengthMismatch { holders: usize, ids: usize },

    #[error("Airdrop of {len} recipients exceeds limit of {max}")]
    AirdropTooLarge { len: usize, max: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CommunityNftError {
    /// Whether this error is an authorization failure.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

pub type Result<T> = std::result::Result<T, CommunityNftError>;
