use serde::{Deserialize, Serialize};

use nftledger_core::{Address, TokenId};
use nftledger_events::Event;

/// Event: Transfer. `from == Address::ZERO` signals a mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub token_id: TokenId,
}

/// Event: Approval. `approved == Address::ZERO` signals a cleared approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    pub owner: Address,
    pub approved: Address,
    pub token_id: TokenId,
}

/// Event: ApprovalForAll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalForAll {
    pub owner: Address,
    pub operator: Address,
    pub approved: bool,
}

/// Everything the ledger can emit.
///
/// Payload field names are a compatibility surface for log consumers and
/// serialize exactly as `from`, `to`, `tokenId`, `owner`, `approved`, `operator`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum LedgerEvent {
    Transfer(Transfer),
    Approval(Approval),
    ApprovalForAll(ApprovalForAll),
}

impl LedgerEvent {
    pub fn transfer(from: Address, to: Address, token_id: TokenId) -> Self {
        Self::Transfer(Transfer { from, to, token_id })
    }

    pub fn approval(owner: Address, approved: Address, token_id: TokenId) -> Self {
        Self::Approval(Approval {
            owner,
            approved,
            token_id,
        })
    }

    pub fn approval_for_all(owner: Address, operator: Address, approved: bool) -> Self {
        Self::ApprovalForAll(ApprovalForAll {
            owner,
            operator,
            approved,
        })
    }
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::Transfer(_) => "nft.transfer",
            LedgerEvent::Approval(_) => "nft.approval",
            LedgerEvent::ApprovalForAll(_) => "nft.approval_for_all",
        }
    }

    fn version(&self) -> u32 {
        1
    }
}
