//! Ledger error model.

use thiserror::Error;

use crate::id::TokenId;

/// Result type used across the ledger domain.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger-level error.
///
/// Every variant is a deterministic rejection: the operation that produced it
/// changed nothing. Infrastructure failures belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Caller lacks the standing an admin-only or owner/operator-only action requires.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The referenced token was never minted.
    #[error("nonexistent token: {0}")]
    NonexistentToken(TokenId),

    /// Caller may not move the token, or `from` is not its owner.
    #[error("{0}")]
    TransferNotAuthorized(String),

    /// A contract recipient refused a safe transfer.
    #[error("recipient rejected: {0}")]
    RecipientRejected(String),

    /// Malformed address at the boundary.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl LedgerError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn nonexistent(token_id: TokenId) -> Self {
        Self::NonexistentToken(token_id)
    }

    pub fn transfer_not_authorized() -> Self {
        Self::TransferNotAuthorized("Transfer not authorized".to_string())
    }

    pub fn recipient_rejected(msg: impl Into<String>) -> Self {
        Self::RecipientRejected(msg.into())
    }

    pub fn invalid_address(input: impl Into<String>) -> Self {
        Self::InvalidAddress(input.into())
    }

    /// Stable machine-readable kind, as exposed to submitters.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Unauthorized(_) => "Unauthorized",
            LedgerError::NonexistentToken(_) => "NonexistentToken",
            LedgerError::TransferNotAuthorized(_) => "TransferNotAuthorized",
            LedgerError::RecipientRejected(_) => "RecipientRejected",
            LedgerError::InvalidAddress(_) => "InvalidAddress",
        }
    }

    /// Human-readable reason (the revert message).
    pub fn reason(&self) -> String {
        match self {
            LedgerError::Unauthorized(msg)
            | LedgerError::TransferNotAuthorized(msg)
            | LedgerError::RecipientRejected(msg) => msg.clone(),
            LedgerError::NonexistentToken(id) => format!("token {id} does not exist"),
            LedgerError::InvalidAddress(input) => format!("'{input}' is not a valid address"),
        }
    }
}
