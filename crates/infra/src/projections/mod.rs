//! Projection implementations (read model builders).
//!
//! Projections consume committed ledger events and build query-optimized read
//! models. They are rebuildable from the log and tolerate at-least-once
//! delivery through `ProjectionRunner`.

pub mod holdings;

pub use holdings::HoldingsProjection;

use serde_json::Value as JsonValue;
use thiserror::Error;

use nftledger_events::{EventEnvelope, Projection, ProjectionError, ProjectionRunner};
use nftledger_token::LedgerEvent;

use crate::event_log::{EventLog, EventLogError};

#[derive(Debug, Error)]
pub enum ProjectionFeedError {
    #[error(transparent)]
    Log(#[from] EventLogError),

    #[error("failed to decode ledger event: {0}")]
    Deserialize(String),

    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

/// Decode a bus envelope (JSON payload) into a typed ledger envelope.
pub fn decode_envelope(
    envelope: EventEnvelope<JsonValue>,
) -> Result<EventEnvelope<LedgerEvent>, ProjectionFeedError> {
    envelope.try_map_payload(|payload| {
        serde_json::from_value(payload).map_err(|e| ProjectionFeedError::Deserialize(e.to_string()))
    })
}

/// Feed every log entry past the runner's cursor into the projection.
///
/// Returns how many envelopes were applied.
pub fn catch_up_from_log<P, L>(
    runner: &mut ProjectionRunner<P>,
    log: &L,
) -> Result<usize, ProjectionFeedError>
where
    P: Projection<Ev = LedgerEvent>,
    L: EventLog + ?Sized,
{
    let after = runner.cursor().map(|c| c.last_sequence_number()).unwrap_or(0);
    let envelopes = log
        .load_after(after)?
        .iter()
        .map(|stored| stored.to_typed_envelope::<LedgerEvent>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(runner.catch_up(&envelopes)?)
}
