//! Infrastructure layer: event log, serialized service, projections, config.

pub mod config;
pub mod event_log;
pub mod projections;
pub mod service;


pub use config::{ConfigError, LedgerConfig};
pub use event_log::{EventLog, EventLogError, InMemoryEventLog, StoredEvent, UncommittedEvent};
pub use projections::{HoldingsProjection, ProjectionFeedError};
pub use service::{LedgerService, ServiceError};
