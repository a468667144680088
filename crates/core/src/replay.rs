//! Ledger replay.
//!
//! Both derived caches in the system (holdings and account balances) are folds
//! over an append-only log. Each log entry implements [`LedgerEvent`] and
//! [`replay`] rebuilds the cache from nothing.

/// An entry of an append-only ledger that can be folded into derived state.
pub trait LedgerEvent {
    /// The derived state produced by replaying events of this kind.
    type State: Default;

    /// Applies this event to the running state.
    fn apply(&self, state: &mut Self::State);
}

/// Folds `events` in iteration order, starting from `State::default()`.
///
/// Callers are responsible for ordering; the fold itself is pure.
pub fn replay<'a, E, I>(events: I) -> E::State
where
    E: LedgerEvent + 'a,
    I: IntoIterator<Item = &'a E>,
{
    let mut state = E::State::default();
    for event in events {
        event.apply(&mut state);
    }
    state
}
