//! `nftledger-token`: the token ledger aggregate.
//!
//! Commands are decided against the current state and yield events; events
//! are the only way state changes. The ledger performs no IO.

pub mod command;
pub mod event;
pub mod ledger;
pub mod recipient;

pub use command::{Approve, LedgerCommand, Mint, SafeTransferFrom, SetApprovalForAll, TransferFrom};
pub use event::{Approval, ApprovalForAll, LedgerEvent, Transfer};
pub use ledger::TokenLedger;
pub use recipient::{ContractRegistry, NoContracts, RecipientCheck, RecipientOracle};
