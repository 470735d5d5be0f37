/// Execute an aggregate command deterministically (no IO, no async).
///
/// 1. **Decide**: `aggregate.handle(command, env)` produces events without mutation.
/// 2. **Evolve**: each event is applied in order via `aggregate.apply(event)`.
///
/// If the decision fails nothing is applied, so a rejected command leaves the
/// aggregate exactly as it was. This is the building block `LedgerService`
/// wraps with logging and publication; tests call it directly.
pub fn execute<A>(
    aggregate: &mut A,
    command: &A::Command,
    env: &A::Env,
) -> Result<Vec<A::Event>, A::Error>
where
    A: nftledger_core::Aggregate,
{
    let events = A::handle(aggregate, command, env)?;
    for ev in &events {
        A::apply(aggregate, ev);
    }
    Ok(events)
}
