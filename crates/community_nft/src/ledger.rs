//! Community NFT ledger implementation
//!
//! One ledger exists per community. It holds multi-token balances, a URI per
//! token id and the two principals allowed to mint: the owner and the relayer.
//! Token id [`MEMBERSHIP_TOKEN_ID`] is reserved for membership and can only be
//! minted through `mint_membership` / `airdrop_membership`.

use crate::errors::*;
use crate::events::LedgerEvent;
use crate::types::*;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Mutable state of a ledger, always accessed under the ledger lock.
#[derive(Debug, Default)]
struct LedgerState {
    owner: Address,
    relayer: Address,
    /// Token id → holder → balance
    balances: HashMap<TokenId, HashMap<Address, Amount>>,
    uris: HashMap<TokenId, String>,
    supplies: HashMap<TokenId, Amount>,
    events: Vec<LedgerEvent>,
}

impl LedgerState {
    fn ensure_owner_or_relayer(&self, ledger: &Address, caller: &Address) -> Result<()> {
        if !caller.is_zero() && (*caller == self.owner || *caller == self.relayer) {
            return Ok(());
        }
        warn!("Rejected mint by {} on ledger {}", caller, ledger);
        Err(CommunityNftError::Unauthorized {
            rule: AuthRule::OwnerOrRelayer,
        })
    }

    fn ensure_owner(&self, ledger: &Address, caller: &Address) -> Result<()> {
        if !caller.is_zero() && *caller == self.owner {
            return Ok(());
        }
        warn!("Rejected owner-only call by {} on ledger {}", caller, ledger);
        Err(CommunityNftError::Unauthorized {
            rule: AuthRule::OwnerOnly,
        })
    }

    fn balance(&self, holder: &Address, token_id: TokenId) -> Amount {
        self.balances
            .get(&token_id)
            .and_then(|holders| holders.get(holder))
            .copied()
            .unwrap_or(0)
    }

    /// Credit every `(holder, amount)` pair of `token_id`, or nothing at all.
    ///
    /// New balances are staged first so a rejected credit late in the list
    /// leaves the state untouched.
    fn credit_all(&mut self, token_id: TokenId, credits: &[(Address, Amount)]) -> Result<()> {
        let mut staged: HashMap<Address, Amount> = HashMap::with_capacity(credits.len());
        let mut supply = self.supplies.get(&token_id).copied().unwrap_or(0);

        for (to, amount) in credits {
            if to.is_zero() {
                return Err(CommunityNftError::InvalidRecipient);
            }
            let current = match staged.get(to) {
                Some(balance) => *balance,
                None => self.balance(to, token_id),
            };
            let next = current
                .checked_add(*amount)
                .ok_or(CommunityNftError::Overflow { token_id })?;
            staged.insert(*to, next);
            supply = supply
                .checked_add(*amount)
                .ok_or(CommunityNftError::Overflow { token_id })?;
        }

        self.balances.entry(token_id).or_default().extend(staged);
        self.supplies.insert(token_id, supply);
        Ok(())
    }
}

/// Point-in-time copy of a ledger, suitable for serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub address: Address,
    pub owner: Address,
    pub relayer: Address,
    pub balances: BTreeMap<TokenId, BTreeMap<Address, Amount>>,
    pub uris: BTreeMap<TokenId, String>,
    pub supplies: BTreeMap<TokenId, Amount>,
}

/// Per-community token ledger.
///
/// Every operation takes the ledger lock exactly once, so concurrent calls on
/// the same ledger are serialized and a failed call changes nothing.
#[derive(Debug)]
pub struct CommunityNft {
    address: Address,
    limits: LedgerLimits,
    state: RwLock<LedgerState>,
}

impl CommunityNft {
    /// Create a ledger and mint one membership token to `owner`.
    pub fn new(
        address: Address,
        owner: Address,
        membership_uri: impl Into<String>,
        relayer: Address,
    ) -> Result<Self> {
        Self::with_limits(address, owner, membership_uri, relayer, LedgerLimits::default())
    }

    /// Same as [`CommunityNft::new`] with explicit operational limits.
    pub fn with_limits(
        address: Address,
        owner: Address,
        membership_uri: impl Into<String>,
        relayer: Address,
        limits: LedgerLimits,
    ) -> Result<Self> {
        if owner.is_zero() {
            return Err(CommunityNftError::InvalidOwner);
        }

        let membership_uri = membership_uri.into();
        let mut state = LedgerState {
            owner,
            relayer,
            ..Default::default()
        };
        state.credit_all(MEMBERSHIP_TOKEN_ID, &[(owner, 1)])?;
        state
            .uris
            .insert(MEMBERSHIP_TOKEN_ID, membership_uri.clone());
        state.events.push(LedgerEvent::OwnershipTransferred {
            previous: Address::ZERO,
            new: owner,
        });
        state.events.push(LedgerEvent::Uri {
            token_id: MEMBERSHIP_TOKEN_ID,
            value: membership_uri,
        });
        state
            .events
            .push(LedgerEvent::minted(owner, owner, MEMBERSHIP_TOKEN_ID, 1));

        info!("Created community ledger {} owned by {}", address, owner);
        Ok(Self {
            address,
            limits,
            state: RwLock::new(state),
        })
    }

    /// Mint one membership token to `to`.
    pub fn mint_membership(&self, caller: &Address, to: Address) -> Result<()> {
        let mut state = self.state.write();
        state.ensure_owner_or_relayer(&self.address, caller)?;
        state.credit_all(MEMBERSHIP_TOKEN_ID, &[(to, 1)])?;
        state
            .events
            .push(LedgerEvent::minted(*caller, to, MEMBERSHIP_TOKEN_ID, 1));

        debug!("Minted membership to {} on ledger {}", to, self.address);
        Ok(())
    }

    /// Mint `amount` of a non-membership token to `to`.
    pub fn mint(
        &self,
        caller: &Address,
        to: Address,
        token_id: TokenId,
        amount: Amount,
    ) -> Result<()> {
        let mut state = self.state.write();
        state.ensure_owner_or_relayer(&self.address, caller)?;
        if token_id == MEMBERSHIP_TOKEN_ID {
            return Err(CommunityNftError::ReservedId { token_id });
        }
        state.credit_all(token_id, &[(to, amount)])?;
        state
            .events
            .push(LedgerEvent::minted(*caller, to, token_id, amount));

        debug!(
            "Minted {} of token {} to {} on ledger {}",
            amount, token_id, to, self.address
        );
        Ok(())
    }

    /// Mint one membership token to each recipient, in list order.
    ///
    /// All recipients are credited or none is.
    pub fn airdrop_membership(&self, caller: &Address, recipients: &[Address]) -> Result<()> {
        let mut state = self.state.write();
        state.ensure_owner_or_relayer(&self.address, caller)?;
        if recipients.len() > self.limits.max_airdrop_recipients {
            return Err(CommunityNftError::AirdropTooLarge {
                len: recipients.len(),
                max: self.limits.max_airdrop_recipients,
            });
        }
        if recipients.is_empty() {
            return Ok(());
        }

        let credits: Vec<(Address, Amount)> = recipients.iter().map(|to| (*to, 1)).collect();
        state.credit_all(MEMBERSHIP_TOKEN_ID, &credits)?;
        state.events.push(LedgerEvent::TransferBatch {
            operator: *caller,
            from: Address::ZERO,
            to: recipients.to_vec(),
            token_id: MEMBERSHIP_TOKEN_ID,
            amount: 1,
        });

        debug!(
            "Airdropped membership to {} recipients on ledger {}",
            recipients.len(),
            self.address
        );
        Ok(())
    }

    /// Set the descriptor of `token_id`.
    pub fn set_uri(
        &self,
        caller: &Address,
        token_id: TokenId,
        uri: impl Into<String>,
    ) -> Result<()> {
        let mut state = self.state.write();
        state.ensure_owner_or_relayer(&self.address, caller)?;
        let uri = uri.into();
        state.uris.insert(token_id, uri.clone());
        state.events.push(LedgerEvent::Uri {
            token_id,
            value: uri,
        });
        Ok(())
    }

    /// Replace the relayer. Owner only.
    pub fn set_relayer(&self, caller: &Address, new_relayer: Address) -> Result<()> {
        let mut state = self.state.write();
        state.ensure_owner(&self.address, caller)?;
        let previous = std::mem::replace(&mut state.relayer, new_relayer);
        state.events.push(LedgerEvent::RelayerChanged {
            previous,
            new: new_relayer,
        });

        info!(
            "Relayer of ledger {} changed from {} to {}",
            self.address, previous, new_relayer
        );
        Ok(())
    }

    /// Hand ownership to `new_owner`. Owner only.
    pub fn transfer_ownership(&self, caller: &Address, new_owner: Address) -> Result<()> {
        let mut state = self.state.write();
        state.ensure_owner(&self.address, caller)?;
        if new_owner.is_zero() {
            return Err(CommunityNftError::InvalidOwner);
        }
        let previous = std::mem::replace(&mut state.owner, new_owner);
        state.events.push(LedgerEvent::OwnershipTransferred {
            previous,
            new: new_owner,
        });

        info!(
            "Ownership of ledger {} transferred from {} to {}",
            self.address, previous, new_owner
        );
        Ok(())
    }

    /// Drop ownership for good. Only the relayer can mint afterwards.
    pub fn renounce_ownership(&self, caller: &Address) -> Result<()> {
        let mut state = self.state.write();
        state.ensure_owner(&self.address, caller)?;
        let previous = std::mem::replace(&mut state.owner, Address::ZERO);
        state.events.push(LedgerEvent::OwnershipTransferred {
            previous,
            new: Address::ZERO,
        });

        info!("Ownership of ledger {} renounced by {}", self.address, previous);
        Ok(())
    }

    pub fn balance_of(&self, holder: &Address, token_id: TokenId) -> Amount {
        self.state.read().balance(holder, token_id)
    }

    /// Balances of `holders[i]` for `token_ids[i]`.
    pub fn balance_of_batch(
        &self,
        holders: &[Address],
        token_ids: &[TokenId],
    ) -> Result<Vec<Amount>> {
        if holders.len() != token_ids.len() {
            return Err(CommunityNftError::LengthMismatch {
                holders: holders.len(),
                ids: token_ids.len(),
            });
        }
        let state = self.state.read();
        Ok(holders
            .iter()
            .zip(token_ids)
            .map(|(holder, token_id)| state.balance(holder, *token_id))
            .collect())
    }

    /// Descriptor of `token_id`, empty when none was set.
    pub fn uri(&self, token_id: TokenId) -> String {
        self.state
            .read()
            .uris
            .get(&token_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn owner(&self) -> Address {
        self.state.read().owner
    }

    pub fn relayer(&self) -> Address {
        self.state.read().relayer
    }

    pub fn total_supply(&self, token_id: TokenId) -> Amount {
        self.state
            .read()
            .supplies
            .get(&token_id)
            .copied()
            .unwrap_or(0)
    }

    /// Whether any unit of `token_id` was ever minted.
    pub fn exists(&self, token_id: TokenId) -> bool {
        self.total_supply(token_id) > 0
    }

    /// Address under which this ledger is registered.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn limits(&self) -> LedgerLimits {
        self.limits
    }

    /// All events recorded so far, oldest first.
    ///
    /// The log is append-only and grows with every mutation; this copies all
    /// of it. Pollers should track `event_count` and use `events_since`.
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.state.read().events.clone()
    }

    pub fn event_count(&self) -> usize {
        self.state.read().events.len()
    }

    /// Events recorded at or after position `from`, oldest first.
    pub fn events_since(&self, from: usize) -> Vec<LedgerEvent> {
        let state = self.state.read();
        state.events.get(from..).map(<[_]>::to_vec).unwrap_or_default()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.state.read();
        LedgerSnapshot {
            address: self.address,
            owner: state.owner,
            relayer: state.relayer,
            balances: state
                .balances
                .iter()
                .map(|(token_id, holders)| {
                    let holders: BTreeMap<Address, Amount> =
                        holders.iter().map(|(h, b)| (*h, *b)).collect();
                    (*token_id, holders)
                })
                .collect(),
            uris: state
                .uris
                .iter()
                .map(|(token_id, uri)| (*token_id, uri.clone()))
                .collect(),
            supplies: state
                .supplies
                .iter()
                .map(|(token_id, supply)| (*token_id, *supply))
                .collect(),
        }
    }

    /// Render the current snapshot as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }
}
