//! Recipient-acceptance check for safe transfers.
//!
//! How an address is known to be a contract, and how the contract answers, is
//! outside the ledger. The ledger only needs the outcome.

use std::collections::HashMap;

use nftledger_core::{Address, TokenId};

/// Outcome of asking whether `to` can take a token.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RecipientCheck {
    /// `to` is a plain account; nothing to confirm.
    NotAContract,
    /// `to` is a contract that implements the receiver capability and accepted.
    Accepted,
    /// `to` is a contract that lacks the capability or refused.
    Rejected,
}

/// Capability query consulted by `safeTransferFrom`.
pub trait RecipientOracle {
    fn check(
        &self,
        operator: Address,
        from: Address,
        to: Address,
        token_id: TokenId,
        data: &[u8],
    ) -> RecipientCheck;
}

/// Oracle for environments without contracts: every address is a plain account.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoContracts;

impl RecipientOracle for NoContracts {
    fn check(&self, _: Address, _: Address, _: Address, _: TokenId, _: &[u8]) -> RecipientCheck {
        RecipientCheck::NotAContract
    }
}

/// Fixed table of known contract addresses and whether each accepts tokens.
#[derive(Debug, Default, Clone)]
pub struct ContractRegistry {
    contracts: HashMap<Address, bool>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, address: Address, accepts: bool) {
        self.contracts.insert(address, accepts);
    }

    pub fn with_contract(mut self, address: Address, accepts: bool) -> Self {
        self.register(address, accepts);
        self
    }

    pub fn is_contract(&self, address: &Address) -> bool {
        self.contracts.contains_key(address)
    }
}

impl RecipientOracle for ContractRegistry {
    fn check(&self, _: Address, _: Address, to: Address, _: TokenId, _: &[u8]) -> RecipientCheck {
        match self.contracts.get(&to) {
            None => RecipientCheck::NotAContract,
            Some(true) => RecipientCheck::Accepted,
            Some(false) => RecipientCheck::Rejected,
        }
    }
}

impl<O> RecipientOracle for &O
where
    O: RecipientOracle + ?Sized,
{
    fn check(
        &self,
        operator: Address,
        from: Address,
        to: Address,
        token_id: TokenId,
        data: &[u8],
    ) -> RecipientCheck {
        (**self).check(operator, from, to, token_id, data)
    }
}
