//! Community NFT factory
//!
//! Deploys one [`CommunityNft`] ledger per community id and keeps the
//! id → ledger registry. The registry is append-only.

use crate::config::FactoryConfig;
use crate::errors::*;
use community_nft::{Address, AuthRule, CommunityNft, LedgerLimits};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Caller-assigned community identifier.
pub type CommunityId = u64;

const LEDGER_ADDRESS_DOMAIN: &[u8] = b"COMMUNITY_NFT";

/// Derive the address of the ledger deployed by `factory` for `id`.
pub fn derive_ledger_address(factory: &Address, id: CommunityId) -> Address {
    let mut h = Sha256::new();
    h.update(LEDGER_ADDRESS_DOMAIN);
    h.update(factory.as_bytes());
    h.update(id.to_le_bytes());
    Address::new(h.finalize().into())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FactoryEvent {
    CommunityDeployed {
        id: CommunityId,
        owner: Address,
        ledger: Address,
    },
}

#[derive(Debug, Default)]
struct Registry {
    ledgers: BTreeMap<CommunityId, Arc<CommunityNft>>,
    events: Vec<FactoryEvent>,
}

/// Factory of community ledgers.
#[derive(Debug)]
pub struct CommunityNftFactory {
    address: Address,
    relayer: Address,
    limits: LedgerLimits,
    registry: RwLock<Registry>,
}

impl CommunityNftFactory {
    /// Create a factory whose `relayer` may deploy any community.
    pub fn new(address: Address, relayer: Address) -> Self {
        Self::with_limits(address, relayer, LedgerLimits::default())
    }

    pub fn with_limits(address: Address, relayer: Address, limits: LedgerLimits) -> Self {
        Self {
            address,
            relayer,
            limits,
            registry: RwLock::new(Registry::default()),
        }
    }

    pub fn from_config(config: &FactoryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_limits(
            config.factory_address,
            config.relayer,
            config.ledger_limits(),
        ))
    }

    /// Deploy the ledger of community `id`, owned by `owner`.
    ///
    /// Callable by the factory relayer or by `owner` itself. The new ledger
    /// gets the factory relayer as its relayer.
    pub fn deploy_community(
        &self,
        caller: &Address,
        id: CommunityId,
        owner: Address,
        membership_uri: impl Into<String>,
    ) -> Result<Arc<CommunityNft>> {
        if caller.is_zero() || (*caller != self.relayer && *caller != owner) {
            warn!("Rejected deployment of community {} by {}", id, caller);
            return Err(CommunityFactoryError::Unauthorized {
                rule: AuthRule::OwnerOrRelayer,
            });
        }
        if owner.is_zero() {
            return Err(CommunityFactoryError::InvalidOwner);
        }

        let mut registry = self.registry.write();
        if registry.ledgers.contains_key(&id) {
            return Err(CommunityFactoryError::AlreadyExists { id });
        }

        let ledger_address = derive_ledger_address(&self.address, id);
        let ledger = Arc::new(CommunityNft::with_limits(
            ledger_address,
            owner,
            membership_uri,
            self.relayer,
            self.limits,
        )?);

        registry.ledgers.insert(id, ledger.clone());
        registry.events.push(FactoryEvent::CommunityDeployed {
            id,
            owner,
            ledger: ledger_address,
        });

        info!(
            "Deployed community {} at {} for owner {}",
            id, ledger_address, owner
        );
        Ok(ledger)
    }

    /// Ledger of community `id`, or `None` when it was never deployed.
    pub fn community_nft(&self, id: CommunityId) -> Option<Arc<CommunityNft>> {
        self.registry.read().ledgers.get(&id).cloned()
    }

    pub fn require_community(&self, id: CommunityId) -> Result<Arc<CommunityNft>> {
        self.community_nft(id)
            .ok_or(CommunityFactoryError::NotFound { id })
    }

    pub fn community_address(&self, id: CommunityId) -> Option<Address> {
        self.registry.read().ledgers.get(&id).map(|l| l.address())
    }

    /// Deployed community ids in ascending order.
    pub fn community_ids(&self) -> Vec<CommunityId> {
        self.registry.read().ledgers.keys().copied().collect()
    }

    pub fn community_count(&self) -> usize {
        self.registry.read().ledgers.len()
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn relayer(&self) -> Address {
        self.relayer
    }

    pub fn limits(&self) -> LedgerLimits {
        self.limits
    }

    pub fn events(&self) -> Vec<FactoryEvent> {
        self.registry.read().events.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use community_nft::{CommunityNftError, MEMBERSHIP_TOKEN_ID};

    const MEMBERSHIP_URI: &str = "tokenURI";

    fn addr(n: u8) -> Address {
        let mut bytes = [0u8; 32];
        bytes[31] = n;
        Address::new(bytes)
    }

    fn factory() -> CommunityNftFactory {
        CommunityNftFactory::new(addr(200), addr(1))
    }

    #[test]
    fn test_relayer_deploys_community() {
        let factory = factory();
        let owner = addr(2);
        let ledger = factory
            .deploy_community(&addr(1), 1, owner, MEMBERSHIP_URI)
            .unwrap();

        assert_eq!(ledger.owner(), owner);
        assert_eq!(ledger.relayer(), addr(1));
        assert_eq!(ledger.balance_of(&owner, MEMBERSHIP_TOKEN_ID), 1);
        assert_eq!(ledger.uri(MEMBERSHIP_TOKEN_ID), MEMBERSHIP_URI);
        assert_eq!(ledger.address(), derive_ledger_address(&addr(200), 1));
        assert_eq!(factory.community_address(1), Some(ledger.address()));
    }

    #[test]
    fn test_owner_deploys_own_community() {
        let factory = factory();
        let owner = addr(2);
        factory
            .deploy_community(&owner, 7, owner, MEMBERSHIP_URI)
            .unwrap();
        assert_eq!(factory.community_nft(7).unwrap().owner(), owner);
    }

    #[test]
    fn test_stranger_cannot_deploy() {
        let factory = factory();
        let err = factory
            .deploy_community(&addr(3), 1, addr(2), MEMBERSHIP_URI)
            .unwrap_err();
        assert_eq!(err.to_string(), "Only owner or relayer can mint");
        assert!(factory.community_nft(1).is_none());
        assert!(factory.events().is_empty());
    }

    #[test]
    fn test_zero_owner_rejected() {
        let factory = factory();
        let err = factory
            .deploy_community(&addr(1), 1, Address::ZERO, MEMBERSHIP_URI)
            .unwrap_err();
        assert!(matches!(err, CommunityFactoryError::InvalidOwner));
    }

    #[test]
    fn test_redeploy_rejected_and_first_ledger_kept() {
        let factory = factory();
        factory
            .deploy_community(&addr(1), 1, addr(2), MEMBERSHIP_URI)
            .unwrap();
        let err = factory
            .deploy_community(&addr(1), 1, addr(5), "other")
            .unwrap_err();
        assert!(matches!(err, CommunityFactoryError::AlreadyExists { id: 1 }));

        let ledger = factory.require_community(1).unwrap();
        assert_eq!(ledger.owner(), addr(2));
        assert_eq!(ledger.uri(MEMBERSHIP_TOKEN_ID), MEMBERSHIP_URI);
        assert_eq!(factory.community_count(), 1);
    }

    #[test]
    fn test_lookup_of_undeployed_community() {
        let factory = factory();
        assert!(factory.community_nft(42).is_none());
        assert!(factory.community_address(42).is_none());
        assert!(matches!(
            factory.require_community(42).unwrap_err(),
            CommunityFactoryError::NotFound { id: 42 }
        ));
    }

    #[test]
    fn test_ledger_addresses_are_distinct() {
        let a = derive_ledger_address(&addr(200), 1);
        assert_ne!(a, derive_ledger_address(&addr(200), 2));
        assert_ne!(a, derive_ledger_address(&addr(201), 1));
        assert_eq!(a, derive_ledger_address(&addr(200), 1));
        assert!(!a.is_zero());
    }

    #[test]
    fn test_community_ids_sorted_and_events_recorded() {
        let factory = factory();
        for id in [9, 3, 5] {
            factory
                .deploy_community(&addr(1), id, addr(2), MEMBERSHIP_URI)
                .unwrap();
        }
        assert_eq!(factory.community_ids(), vec![3, 5, 9]);
        assert_eq!(
            factory.events()[0],
            FactoryEvent::CommunityDeployed {
                id: 9,
                owner: addr(2),
                ledger: derive_ledger_address(&addr(200), 9),
            }
        );
    }

    #[test]
    fn test_ledger_relayer_rotation_does_not_touch_factory_relayer() {
        let factory = factory();
        let owner = addr(2);
        let ledger = factory
            .deploy_community(&addr(1), 1, owner, MEMBERSHIP_URI)
            .unwrap();
        ledger.set_relayer(&owner, addr(8)).unwrap();

        assert_eq!(factory.relayer(), addr(1));
        assert!(factory
            .deploy_community(&addr(8), 2, addr(4), MEMBERSHIP_URI)
            .is_err());
        factory
            .deploy_community(&addr(1), 2, addr(4), MEMBERSHIP_URI)
            .unwrap();
        assert_eq!(factory.community_nft(2).unwrap().relayer(), addr(1));
    }

    #[test]
    fn test_limits_propagate_to_ledgers() {
        let limits = LedgerLimits {
            max_airdrop_recipients: 1,
        };
        let factory = CommunityNftFactory::with_limits(addr(200), addr(1), limits);
        let ledger = factory
            .deploy_community(&addr(1), 1, addr(2), MEMBERSHIP_URI)
            .unwrap();
        let err = ledger
            .airdrop_membership(&addr(1), &[addr(3), addr(4)])
            .unwrap_err();
        assert!(matches!(err, CommunityNftError::AirdropTooLarge { .. }));
    }

    #[test]
    fn test_from_config_validates() {
        let config = FactoryConfig::new(addr(200), Address::ZERO);
        assert!(matches!(
            CommunityNftFactory::from_config(&config).unwrap_err(),
            CommunityFactoryError::Config(_)
        ));

        let config = FactoryConfig::new(addr(200), addr(1));
        let factory = CommunityNftFactory::from_config(&config).unwrap();
        assert_eq!(factory.relayer(), addr(1));
        assert_eq!(factory.address(), addr(200));
    }
}
