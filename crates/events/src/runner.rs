//! Projection runner utilities (read model builders).
//!
//! Read models are **disposable**; the event log is the source of truth.
//! This module provides deterministic replay and cursor tracking without
//! making storage assumptions.

use thiserror::Error;

use crate::{EventEnvelope, Projection};

/// Tracks how far into the log a projection has read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProjectionCursor {
    last_sequence_number: u64,
}

impl ProjectionCursor {
    pub fn last_sequence_number(&self) -> u64 {
        self.last_sequence_number
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    /// The envelope was already applied, or arrived out of order.
    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
}

/// Runs envelopes through a projection and tracks progress.
#[derive(Debug)]
pub struct ProjectionRunner<P>
where
    P: Projection,
{
    projection: P,
    cursor: Option<ProjectionCursor>,
}

impl<P> ProjectionRunner<P>
where
    P: Projection,
{
    pub fn new(projection: P) -> Self {
        Self {
            projection,
            cursor: None,
        }
    }

    pub fn projection(&self) -> &P {
        &self.projection
    }

    /// Current cursor (if any envelopes were applied).
    pub fn cursor(&self) -> Option<ProjectionCursor> {
        self.cursor
    }

    /// Apply a single envelope, enforcing monotonic sequencing.
    pub fn apply(&mut self, envelope: &EventEnvelope<P::Ev>) -> Result<(), ProjectionError> {
        let found = envelope.sequence_number();
        if let Some(c) = self.cursor {
            if found <= c.last_sequence_number {
                return Err(ProjectionError::NonMonotonicSequence {
                    last: c.last_sequence_number,
                    found,
                });
            }
        }

        self.projection.apply(envelope);
        self.cursor = Some(ProjectionCursor {
            last_sequence_number: found,
        });
        Ok(())
    }

    /// Apply envelopes in order, skipping any already covered by the cursor.
    ///
    /// This is the catch-up path: feed it the full log (or an overlapping
    /// tail) and only unseen envelopes reach the projection.
    pub fn catch_up<'a>(
        &mut self,
        envelopes: impl IntoIterator<Item = &'a EventEnvelope<P::Ev>>,
    ) -> Result<usize, ProjectionError>
    where
        P::Ev: 'a,
    {
        let mut applied = 0;
        for env in envelopes {
            let seen = self
                .cursor
                .is_some_and(|c| env.sequence_number() <= c.last_sequence_number);
            if seen {
                continue;
            }
            self.apply(env)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Rebuild a projection from scratch by replaying the full event history.
    pub fn rebuild_from_scratch<'a>(
        factory: impl FnOnce() -> P,
        envelopes: impl IntoIterator<Item = &'a EventEnvelope<P::Ev>>,
    ) -> Result<(P, Option<ProjectionCursor>), ProjectionError>
    where
        P::Ev: 'a,
    {
        let mut runner = ProjectionRunner::new(factory());
        for env in envelopes {
            runner.apply(env)?;
        }
        Ok((runner.projection, runner.cursor))
    }
}
