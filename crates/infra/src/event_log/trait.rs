use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use nftledger_core::ExpectedVersion;
use nftledger_events::EventEnvelope;
use std::sync::Arc;

/// An event ready to be appended to the log (not yet assigned a sequence number).
///
/// Built from a typed ledger event with `UncommittedEvent::from_typed()`, which
/// serializes the payload to JSON and captures the event type and version
/// needed to read it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncommittedEvent {
    pub event_id: Uuid,
    pub event_type: String,
    pub event_version: u32,
    pub payload: JsonValue,
}

/// A committed event: assigned a sequence number and a commit timestamp.
///
/// Sequence numbers start at 1, increase by exactly one per event, and never
/// change once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub event_id: Uuid,

    /// Position in the log.
    pub sequence_number: u64,

    pub event_type: String,
    pub event_version: u32,
    pub recorded_at: DateTime<Utc>,

    pub payload: JsonValue,
}

impl StoredEvent {
    /// Envelope for publication on the bus (JSON payload).
    pub fn to_envelope(&self) -> EventEnvelope<JsonValue> {
        EventEnvelope::new(
            self.event_id,
            self.event_type.clone(),
            self.sequence_number,
            self.recorded_at,
            self.payload.clone(),
        )
    }

    /// Decode the payload back into a typed event.
    pub fn to_typed<E>(&self) -> Result<E, EventLogError>
    where
        E: DeserializeOwned,
    {
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            EventLogError::Deserialize(format!(
                "sequence_number {}: {e}",
                self.sequence_number
            ))
        })
    }

    /// Envelope with a typed payload, for projections.
    pub fn to_typed_envelope<E>(&self) -> Result<EventEnvelope<E>, EventLogError>
    where
        E: DeserializeOwned,
    {
        let payload = self.to_typed()?;
        Ok(EventEnvelope::new(
            self.event_id,
            self.event_type.clone(),
            self.sequence_number,
            self.recorded_at,
            payload,
        ))
    }
}

/// Event log operation error.
///
/// These are infrastructure errors, as opposed to ledger rejections.
#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("invalid append: {0}")]
    InvalidAppend(String),

    #[error("payload could not be decoded: {0}")]
    Deserialize(String),

    #[error("event log lock poisoned")]
    Poisoned,
}

/// Append-only event log.
///
/// Implementations must:
/// - check `expected_version` against the current log length before appending
/// - assign sequence numbers starting at `current_version + 1`, without gaps
/// - persist a batch atomically (all of it or none of it)
pub trait EventLog: Send + Sync {
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventLogError>;

    /// Every committed event, in sequence order.
    fn load_all(&self) -> Result<Vec<StoredEvent>, EventLogError>;

    /// Committed events with a sequence number greater than `after`.
    fn load_after(&self, after: u64) -> Result<Vec<StoredEvent>, EventLogError> {
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|e| e.sequence_number > after)
            .collect())
    }

    /// Sequence number of the last committed event (0 when empty).
    fn current_version(&self) -> Result<u64, EventLogError> {
        Ok(self.load_all()?.last().map(|e| e.sequence_number).unwrap_or(0))
    }
}

impl<L> EventLog for Arc<L>
where
    L: EventLog + ?Sized,
{
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventLogError> {
        (**self).append(events, expected_version)
    }

    fn load_all(&self) -> Result<Vec<StoredEvent>, EventLogError> {
        (**self).load_all()
    }

    fn load_after(&self, after: u64) -> Result<Vec<StoredEvent>, EventLogError> {
        (**self).load_after(after)
    }

    fn current_version(&self) -> Result<u64, EventLogError> {
        (**self).current_version()
    }
}

impl UncommittedEvent {
    /// Convenience constructor from a typed ledger event.
    pub fn from_typed<E>(event_id: Uuid, event: &E) -> Result<Self, EventLogError>
    where
        E: nftledger_events::Event + Serialize,
    {
        let payload = serde_json::to_value(event)
            .map_err(|e| EventLogError::InvalidAppend(format!("payload serialization failed: {e}")))?;

        Ok(Self {
            event_id,
            event_type: event.event_type().to_string(),
            event_version: event.version(),
            payload,
        })
    }
}
