//! Events emitted by a community ledger

use crate::types::{Address, Amount, TokenId};
use serde::{Deserialize, Serialize};

/// A state change recorded by a ledger.
///
/// Mints are recorded the ERC-1155 way, as transfers from the zero address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    TransferSingle {
        operator: Address,
        from: Address,
        to: Address,
        token_id: TokenId,
        amount: Amount,
    },
    /// One event per airdrop, covering every recipient in list order.
    TransferBatch {
        operator: Address,
        from: Address,
        to: Vec<Address>,
        token_id: TokenId,
        amount: Amount,
    },
    Uri {
        token_id: TokenId,
        value: String,
    },
    RelayerChanged {
        previous: Address,
        new: Address,
    },
    OwnershipTransferred {
        previous: Address,
        new: Address,
    },
}

impl LedgerEvent {
    pub(crate) fn minted(
        operator: Address,
        to: Address,
        token_id: TokenId,
        amount: Amount,
    ) -> Self {
        Self::TransferSingle {
            operator,
            from: Address::ZERO,
            to,
            token_id,
            amount,
        }
    }
}
