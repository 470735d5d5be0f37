use nftledger_core::Address;

/// A request submitted against the ledger on behalf of a caller.
///
/// Commands represent **intent**. They are transient: a command is either
/// rejected (with no effect) or turned into events, and only the events are
/// recorded.
///
/// The caller identity is supplied by the transaction submitter and is what
/// every authorization rule is evaluated against.
///
/// Commands must be cloneable, thread-safe and own all their data so the
/// submitter can queue, log and hand them across threads.
pub trait Command: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Identity on whose behalf the command runs.
    fn caller(&self) -> Address;

    /// Operation name as exposed to submitters (e.g. "transferFrom").
    fn operation(&self) -> &'static str;
}
