use crate::{Event, EventEnvelope};

/// A projection builds a read model from the append-only event log.
///
/// Read models are disposable: they can be dropped and rebuilt by replaying
/// the log from the first sequence number. Use `ProjectionRunner` to feed a
/// projection; it enforces monotonic sequencing so duplicates delivered by the
/// bus are rejected instead of double-counted.
pub trait Projection {
    type Ev: Event;

    /// Apply a single event to the read model.
    ///
    /// Events not relevant to this projection should be ignored.
    fn apply(&mut self, envelope: &EventEnvelope<Self::Ev>);
}
