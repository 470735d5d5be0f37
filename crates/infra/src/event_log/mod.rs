//! Append-only event log boundary.
//!
//! The log is the ledger's source of truth: an ordered sequence of committed
//! events that can be replayed to rebuild the ledger or any read model.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventLog;
pub use r#trait::{EventLog, EventLogError, StoredEvent, UncommittedEvent};
