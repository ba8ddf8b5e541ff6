//! Community NFT Ledger
//!
//! A per-community multi-token ledger. Each community gets one ledger whose
//! token id `1` is the membership token: exactly one unit is minted to the
//! owner at construction and further units only through the membership mint
//! and airdrop paths. Any other token id can be minted freely by the owner
//! or the relayer.

pub mod errors;
pub mod events;
pub mod ledger;
pub mod types;

pub use errors::*;
pub use events::LedgerEvent;
pub use ledger::{CommunityNft, LedgerSnapshot};
pub use types::*;
