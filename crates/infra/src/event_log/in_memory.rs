use std::sync::RwLock;

use chrono::Utc;
use nftledger_core::ExpectedVersion;

use super::r#trait::{EventLog, EventLogError, StoredEvent, UncommittedEvent};

/// In-memory append-only event log.
///
/// Used by tests, the CLI and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    events: RwLock<Vec<StoredEvent>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed events.
    pub fn len(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn version_of(events: &[StoredEvent]) -> u64 {
        events.last().map(|e| e.sequence_number).unwrap_or(0)
    }
}

impl EventLog for InMemoryEventLog {
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventLogError> {
        if events.is_empty() {
            return Ok(vec![]);
        }

        let mut log = self.events.write().map_err(|_| EventLogError::Poisoned)?;
        let current = Self::version_of(&log);

        if !expected_version.matches(current) {
            return Err(EventLogError::Concurrency(format!(
                "expected {expected_version:?}, found {current}"
            )));
        }

        // One timestamp per batch: the events were decided together.
        let recorded_at = Utc::now();
        let mut next = current + 1;
        let mut committed = Vec::with_capacity(events.len());
        for e in events {
            let stored = StoredEvent {
                event_id: e.event_id,
                sequence_number: next,
                event_type: e.event_type,
                event_version: e.event_version,
                recorded_at,
                payload: e.payload,
            };
            next += 1;
            log.push(stored.clone());
            committed.push(stored);
        }

        Ok(committed)
    }

    fn load_all(&self) -> Result<Vec<StoredEvent>, EventLogError> {
        let log = self.events.read().map_err(|_| EventLogError::Poisoned)?;
        Ok(log.clone())
    }

    fn load_after(&self, after: u64) -> Result<Vec<StoredEvent>, EventLogError> {
        let log = self.events.read().map_err(|_| EventLogError::Poisoned)?;
        // Sequence numbers are dense from 1, so `after` is also an index.
        let start = usize::try_from(after).unwrap_or(usize::MAX).min(log.len());
        Ok(log[start..].to_vec())
    }

    fn current_version(&self) -> Result<u64, EventLogError> {
        let log = self.events.read().map_err(|_| EventLogError::Poisoned)?;
        Ok(Self::version_of(&log))
    }
}
