//! Error types for the community factory

use crate::factory::CommunityId;
use community_nft::{AuthRule, CommunityNftError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommunityFactoryError {
    #[error("{rule}")]
    Unauthorized { rule: AuthRule },

    #[error("Community already deployed: {id}")]
    AlreadyExists { id: CommunityId },

    #[error("Community not found: {id}")]
    NotFound { id: CommunityId },

    #[error("Community owner is the zero address")]
    InvalidOwner,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Ledger(#[from] CommunityNftError),
}

pub type Result<T> = std::result::Result<T, CommunityFactoryError>;
