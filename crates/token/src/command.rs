use serde::{Deserialize, Serialize};

use nftledger_core::{Address, TokenId};
use nftledger_events::Command;

/// Command: Mint. Admin only; the new token goes to the admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mint {
    pub caller: Address,
}

/// Command: TransferFrom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferFrom {
    pub caller: Address,
    pub from: Address,
    pub to: Address,
    pub token_id: TokenId,
}

/// Command: SafeTransferFrom. `data` is handed to the recipient check untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeTransferFrom {
    pub caller: Address,
    pub from: Address,
    pub to: Address,
    pub token_id: TokenId,
    #[serde(default)]
    pub data: Vec<u8>,
}

/// Command: Approve. Approving `Address::ZERO` clears the approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approve {
    pub caller: Address,
    pub approved: Address,
    pub token_id: TokenId,
}

/// Command: SetApprovalForAll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetApprovalForAll {
    pub caller: Address,
    pub operator: Address,
    pub approved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCommand {
    Mint(Mint),
    TransferFrom(TransferFrom),
    SafeTransferFrom(SafeTransferFrom),
    Approve(Approve),
    SetApprovalForAll(SetApprovalForAll),
}

impl LedgerCommand {
    pub fn mint(caller: Address) -> Self {
        Self::Mint(Mint { caller })
    }

    pub fn transfer_from(caller: Address, from: Address, to: Address, token_id: TokenId) -> Self {
        Self::TransferFrom(TransferFrom {
            caller,
            from,
            to,
            token_id,
        })
    }

    pub fn safe_transfer_from(
        caller: Address,
        from: Address,
        to: Address,
        token_id: TokenId,
        data: Vec<u8>,
    ) -> Self {
        Self::SafeTransferFrom(SafeTransferFrom {
            caller,
            from,
            to,
            token_id,
            data,
        })
    }

    pub fn approve(caller: Address, approved: Address, token_id: TokenId) -> Self {
        Self::Approve(Approve {
            caller,
            approved,
            token_id,
        })
    }

    pub fn set_approval_for_all(caller: Address, operator: Address, approved: bool) -> Self {
        Self::SetApprovalForAll(SetApprovalForAll {
            caller,
            operator,
            approved,
        })
    }

    /// Token the command refers to, if any (used for log fields).
    pub fn token_id(&self) -> Option<TokenId> {
        match self {
            LedgerCommand::Mint(_) | LedgerCommand::SetApprovalForAll(_) => None,
            LedgerCommand::TransferFrom(c) => Some(c.token_id),
            LedgerCommand::SafeTransferFrom(c) => Some(c.token_id),
            LedgerCommand::Approve(c) => Some(c.token_id),
        }
    }
}

impl Command for LedgerCommand {
    fn caller(&self) -> Address {
        match self {
            LedgerCommand::Mint(c) => c.caller,
            LedgerCommand::TransferFrom(c) => c.caller,
            LedgerCommand::SafeTransferFrom(c) => c.caller,
            LedgerCommand::Approve(c) => c.caller,
            LedgerCommand::SetApprovalForAll(c) => c.caller,
        }
    }

    fn operation(&self) -> &'static str {
        match self {
            LedgerCommand::Mint(_) => "mint",
            LedgerCommand::TransferFrom(_) => "transferFrom",
            LedgerCommand::SafeTransferFrom(_) => "safeTransferFrom",
            LedgerCommand::Approve(_) => "approve",
            LedgerCommand::SetApprovalForAll(_) => "setApprovalForAll",
        }
    }
}
