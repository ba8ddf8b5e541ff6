//! Community NFT Factory
//!
//! Gates community creation and keeps the registry mapping each community id
//! to its [`community_nft::CommunityNft`] ledger. Deployment is allowed to the
//! factory relayer or to the declared community owner.

pub mod config;
pub mod errors;
pub mod factory;

pub use config::FactoryConfig;
pub use errors::*;
pub use factory::{derive_ledger_address, CommunityId, CommunityNftFactory, FactoryEvent};
