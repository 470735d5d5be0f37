//! `nftledger-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, ExpectedVersion};
pub use error::{LedgerError, LedgerResult};
pub use id::{ADDRESS_LEN, Address, TokenId};
