//! Point-in-time arena status for external queries.

use std::fmt;

use skirmish_core::{Lifecycle, StateKey, UnitId};

/// Snapshot of an arena's externally visible state.
///
/// Assembled from independent reads; a tick running concurrently may
/// make the fields mutually inconsistent (for example `next` already
/// cleared while `current` still shows the old state).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaStatus {
    /// The arena's unit ID.
    pub unit: UnitId,
    /// The arena's name.
    pub name: String,
    /// Lifecycle phase.
    pub lifecycle: Lifecycle,
    /// Current state, if any.
    pub current: Option<StateKey>,
    /// Pending transition request, if any.
    pub next: Option<StateKey>,
    /// Ticks run so far (excluding rejected concurrent calls).
    pub ticks: u64,
    /// Accepted transitions so far.
    pub transitions: u64,
}

impl fmt::Display for ArenaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] ", self.name, self.lifecycle)?;
        match self.current {
            Some(state) => write!(f, "in {state}")?,
            None => write!(f, "no state")?,
        }
        if let Some(next) = self.next {
            write!(f, ", next {next}")?;
        }
        write!(f, " ({} ticks, {} transitions)", self.ticks, self.transitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Lobby;
    struct Playing;

    #[test]
    fn display_summarizes_state() {
        let status = ArenaStatus {
            unit: UnitId::next(),
            name: "arena-1".into(),
            lifecycle: Lifecycle::Ready,
            current: Some(StateKey::of::<Lobby>()),
            next: Some(StateKey::of::<Playing>()),
            ticks: 12,
            transitions: 1,
        };
        assert_eq!(
            status.to_string(),
            "arena-1 [ready] in Lobby, next Playing (12 ticks, 1 transitions)"
        );
    }
}
