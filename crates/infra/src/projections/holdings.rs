//! Holdings projection.
//!
//! Per-address token sets derived from `Transfer` events. Approvals do not
//! affect holdings and are ignored.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use nftledger_core::{Address, TokenId};
use nftledger_events::{EventEnvelope, Projection};
use nftledger_token::LedgerEvent;

/// Read model: who holds which tokens.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HoldingsProjection {
    by_owner: HashMap<Address, BTreeSet<TokenId>>,
    owners: BTreeMap<TokenId, Address>,
}

impl HoldingsProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokens held by `owner`, ascending.
    pub fn tokens_of(&self, owner: Address) -> Vec<TokenId> {
        self.by_owner
            .get(&owner)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn balance_of(&self, owner: Address) -> u64 {
        self.by_owner.get(&owner).map(|set| set.len() as u64).unwrap_or(0)
    }

    pub fn owner_of(&self, token_id: TokenId) -> Option<Address> {
        self.owners.get(&token_id).copied()
    }

    pub fn token_count(&self) -> usize {
        self.owners.len()
    }

    /// Addresses currently holding at least one token.
    pub fn holders(&self) -> impl Iterator<Item = Address> + '_ {
        self.by_owner.keys().copied()
    }
}

impl Projection for HoldingsProjection {
    type Ev = LedgerEvent;

    fn apply(&mut self, envelope: &EventEnvelope<LedgerEvent>) {
        let LedgerEvent::Transfer(t) = envelope.payload() else {
            return;
        };

        // Previous holder comes from the read model itself, so mints (from
        // the zero address) need no special case.
        if let Some(previous) = self.owners.insert(t.token_id, t.to) {
            if let Some(set) = self.by_owner.get_mut(&previous) {
                set.remove(&t.token_id);
                if set.is_empty() {
                    self.by_owner.remove(&previous);
                }
            }
        }
        self.by_owner.entry(t.to).or_default().insert(t.token_id);
    }
}
