use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope for an event, carrying its position in the ledger's log.
///
/// This is the unit the event log sink records and the bus fans out.
///
/// Notes:
/// - `sequence_number` starts at 1 and increases by exactly one per event.
/// - `recorded_at` is set when the event is committed, never by the ledger itself.
/// - `payload` is the event body (typed, or JSON once it has crossed the log).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    event_type: String,

    /// Monotonically increasing position in the ledger's log.
    sequence_number: u64,

    recorded_at: DateTime<Utc>,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        event_type: impl Into<String>,
        sequence_number: u64,
        recorded_at: DateTime<Utc>,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            event_type: event_type.into(),
            sequence_number,
            recorded_at,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }

    /// Swap the payload while keeping log metadata (e.g. JSON → typed).
    pub fn try_map_payload<T, Err>(
        self,
        f: impl FnOnce(E) -> Result<T, Err>,
    ) -> Result<EventEnvelope<T>, Err> {
        let payload = f(self.payload)?;
        Ok(EventEnvelope {
            event_id: self.event_id,
            event_type: self.event_type,
            sequence_number: self.sequence_number,
            recorded_at: self.recorded_at,
            payload,
        })
    }
}
