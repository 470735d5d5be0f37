//! Serialized command pipeline for the token ledger.
//!
//! ```text
//! LedgerCommand
//!   ↓
//! 1. Decide against the live ledger (pure; consults the recipient oracle)
//!   ↓
//! 2. Append decided events to the log (ExpectedVersion = ledger version)
//!   ↓
//! 3. Apply the same events to the live ledger
//!   ↓
//! 4. Publish committed envelopes on the bus
//! ```
//!
//! All four steps run under one lock, so the log order is the application
//! order and no two operations interleave. A rejected command stops at step 1
//! and leaves no trace in the ledger, the log or the bus.

use std::sync::{Mutex, MutexGuard};

use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use nftledger_core::{Address, Aggregate, ExpectedVersion, LedgerError, TokenId};
use nftledger_events::{Command, EventBus, EventEnvelope};
use nftledger_token::{LedgerCommand, LedgerEvent, RecipientOracle, TokenLedger};

use crate::event_log::{EventLog, EventLogError, StoredEvent, UncommittedEvent};

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The ledger rejected the operation; nothing was recorded.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Reading or appending the event log failed.
    #[error("event log: {0}")]
    Log(#[from] EventLogError),

    /// Publication failed after a successful append (consumers catch up from the log).
    #[error("event publication failed: {0}")]
    Publish(String),

    #[error("ledger lock poisoned")]
    Poisoned,
}

/// Owns the live ledger and commits its events.
///
/// - `L`: event log (source of truth)
/// - `B`: distribution bus for committed envelopes
/// - `O`: recipient oracle consulted by `safeTransferFrom`
#[derive(Debug)]
pub struct LedgerService<L, B, O> {
    ledger: Mutex<TokenLedger>,
    log: L,
    bus: B,
    oracle: O,
}

impl<L, B, O> LedgerService<L, B, O>
where
    L: EventLog,
    B: EventBus<EventEnvelope<JsonValue>>,
    O: RecipientOracle + 'static,
{
    /// Open a service over `log`, rehydrating the ledger from whatever the log
    /// already holds.
    pub fn new(admin: Address, log: L, bus: B, oracle: O) -> Result<Self, ServiceError> {
        let history = log.load_all()?;
        let ledger = rehydrate(admin, &history)?;
        debug!(admin = %admin, events = history.len(), "ledger opened");

        Ok(Self {
            ledger: Mutex::new(ledger),
            log,
            bus,
            oracle,
        })
    }

    /// Decide, record, apply and publish one operation.
    ///
    /// Returns the committed events (with sequence numbers).
    pub fn submit(&self, command: LedgerCommand) -> Result<Vec<StoredEvent>, ServiceError> {
        let mut ledger = self.lock()?;
        let operation = command.operation();
        let caller = command.caller();

        // 1) Decide (no mutation)
        let oracle: &dyn RecipientOracle = &self.oracle;
        let decided = match ledger.handle(&command, oracle) {
            Ok(events) => events,
            Err(err) => {
                warn!(
                    operation,
                    caller = %caller,
                    token_id = ?command.token_id(),
                    kind = err.kind(),
                    reason = %err.reason(),
                    "operation rejected"
                );
                return Err(ServiceError::Ledger(err));
            }
        };
        if decided.is_empty() {
            return Ok(vec![]);
        }

        // 2) Record (append-only, optimistic)
        let uncommitted = decided
            .iter()
            .map(|ev| UncommittedEvent::from_typed(Uuid::now_v7(), ev))
            .collect::<Result<Vec<_>, _>>()?;
        let expected = ExpectedVersion::Exact(ledger.version());
        let committed = self.log.append(uncommitted, expected)?;

        // 3) Apply
        for ev in &decided {
            ledger.apply(ev);
        }

        info!(
            operation,
            caller = %caller,
            token_id = ?command.token_id(),
            events = committed.len(),
            sequence_number = committed.last().map(|e| e.sequence_number),
            "operation committed"
        );

        // 4) Publish committed events (after append)
        for stored in &committed {
            self.bus
                .publish(stored.to_envelope())
                .map_err(|e| ServiceError::Publish(e.to_string()))?;
        }

        Ok(committed)
    }

    /// Rebuild a ledger from the log alone.
    pub fn replay(&self) -> Result<TokenLedger, ServiceError> {
        let history = self.log.load_all()?;
        let replayed = rehydrate(self.lock()?.admin(), &history)?;
        debug!(events = history.len(), "ledger replayed");
        Ok(replayed)
    }

    /// Whether replaying the log reproduces the live ledger exactly.
    pub fn verify_replay(&self) -> Result<bool, ServiceError> {
        // Hold the lock for the whole check so no commit lands between the two reads.
        let ledger = self.lock()?;
        let history = self.log.load_all()?;
        let replayed = rehydrate(ledger.admin(), &history)?;
        let consistent = replayed == *ledger;
        if !consistent {
            warn!(events = history.len(), "replayed ledger differs from live ledger");
        }
        Ok(consistent)
    }
}

impl<L, B, O> LedgerService<L, B, O> {
    fn lock(&self) -> Result<MutexGuard<'_, TokenLedger>, ServiceError> {
        self.ledger.lock().map_err(|_| ServiceError::Poisoned)
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Consistent copy of the live ledger.
    pub fn snapshot(&self) -> Result<TokenLedger, ServiceError> {
        Ok(self.lock()?.clone())
    }

    pub fn admin(&self) -> Result<Address, ServiceError> {
        Ok(self.lock()?.admin())
    }

    pub fn balance_of(&self, owner: Address) -> Result<u64, ServiceError> {
        let balance = self.lock()?.balance_of(owner);
        debug!(owner = %owner, balance, "balanceOf");
        Ok(balance)
    }

    pub fn owner_of(&self, token_id: TokenId) -> Result<Address, ServiceError> {
        let owner = self.lock()?.owner_of(token_id)?;
        debug!(token_id = %token_id, owner = %owner, "ownerOf");
        Ok(owner)
    }

    pub fn get_approved(&self, token_id: TokenId) -> Result<Option<Address>, ServiceError> {
        let approved = self.lock()?.get_approved(token_id)?;
        debug!(token_id = %token_id, approved = ?approved, "getApproved");
        Ok(approved)
    }

    pub fn is_approved_for_all(&self, owner: Address, operator: Address) -> Result<bool, ServiceError> {
        let approved = self.lock()?.is_approved_for_all(owner, operator);
        debug!(owner = %owner, operator = %operator, approved, "isApprovedForAll");
        Ok(approved)
    }

    pub fn next_token_id(&self) -> Result<TokenId, ServiceError> {
        Ok(self.lock()?.next_token_id())
    }

    pub fn total_minted(&self) -> Result<u64, ServiceError> {
        Ok(self.lock()?.total_minted())
    }
}

fn rehydrate(admin: Address, history: &[StoredEvent]) -> Result<TokenLedger, ServiceError> {
    validate_sequence(history)?;
    let events = history
        .iter()
        .map(|stored| stored.to_typed::<LedgerEvent>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TokenLedger::rehydrate(admin, &events))
}

fn validate_sequence(history: &[StoredEvent]) -> Result<(), EventLogError> {
    for (idx, e) in history.iter().enumerate() {
        let expected = idx as u64 + 1;
        if e.sequence_number != expected {
            return Err(EventLogError::InvalidAppend(format!(
                "log has sequence_number {} at position {expected}",
                e.sequence_number
            )));
        }
    }
    Ok(())
}
