//! Aggregate trait for event-sourced state machines.

/// Optimistic concurrency expectation for an event stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking.
    Any,
    /// Require the stream to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }
}

/// Aggregate execution semantics (pure, deterministic).
///
/// - **Decision logic**: `handle(&self, cmd, env)` returns events.
/// - **State mutation**: `apply(&mut self, event)` evolves state.
///
/// `Env` holds the read-only collaborators a decision may consult (for the
/// token ledger, the recipient-acceptance oracle). Aggregates must not perform
/// IO; they only return events describing what happened.
pub trait Aggregate {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;
    type Env: ?Sized;

    /// Number of events applied so far.
    fn version(&self) -> u64;

    /// Evolve in-memory state from a single event.
    ///
    /// Implementations must stay deterministic and bump `version()` by one per call.
    fn apply(&mut self, event: &Self::Event);

    /// Decide which events to emit given the current state and a command.
    ///
    /// This must not mutate state. State evolution is done through `apply`.
    fn handle(
        &self,
        command: &Self::Command,
        env: &Self::Env,
    ) -> Result<Vec<Self::Event>, Self::Error>;
}
