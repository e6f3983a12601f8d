//! Tick results and errors.

use std::fmt;

use skirmish_core::{HookError, Phase, StateKey};
use thiserror::Error;

/// What a successful [`Arena::tick`](crate::Arena::tick) did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// No current state and no actionable request: no hook ran.
    Idle,
    /// No transition; the current state's `update` ran.
    Updated {
        /// The state that was updated.
        state: StateKey,
    },
    /// The guard accepted a transition: `end` ran on `from` (if any),
    /// then `start` on `to`. No `update` ran.
    Transitioned {
        /// The state that was left, if there was one.
        from: Option<StateKey>,
        /// The state that was entered.
        to: StateKey,
    },
    /// The guard rejected the pending request.
    ///
    /// The request is still pending unless the guard cleared it, and will
    /// be offered to the guard again on the next tick. The current state
    /// (if any) was updated.
    Rejected {
        /// The request the guard turned down.
        pending: StateKey,
        /// The state that was updated, if there was one.
        updated: Option<StateKey>,
    },
}

impl TickOutcome {
    /// Whether a transition happened.
    pub fn is_transition(&self) -> bool {
        matches!(self, Self::Transitioned { .. })
    }

    /// The state whose `update` hook ran this tick, if any.
    pub fn updated(&self) -> Option<StateKey> {
        match self {
            Self::Updated { state } => Some(*state),
            Self::Rejected { updated, .. } => *updated,
            Self::Idle | Self::Transitioned { .. } => None,
        }
    }
}

impl fmt::Display for TickOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Updated { state } => write!(f, "updated {state}"),
            Self::Transitioned { from: Some(from), to } => write!(f, "{from} -> {to}"),
            Self::Transitioned { from: None, to } => write!(f, "-> {to}"),
            Self::Rejected { pending, .. } => write!(f, "rejected {pending}"),
        }
    }
}

/// Errors from [`Arena::tick`](crate::Arena::tick).
#[derive(Debug, Error)]
pub enum TickError {
    /// Another tick of the same arena is still running (a second driver,
    /// or a hook calling `tick()`). Nothing was changed.
    #[error("arena '{arena}' is already ticking")]
    AlreadyTicking {
        /// The arena.
        arena: String,
    },
    /// A state hook or the transition guard failed; the rest of the tick
    /// was skipped.
    #[error("arena '{arena}' {phase} hook of {state} failed")]
    Hook {
        /// The arena.
        arena: String,
        /// Which hook.
        phase: Phase,
        /// The state the hook belongs to (for the guard: the proposed state).
        state: StateKey,
        /// The hook's error.
        #[source]
        source: HookError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    struct Lobby;
    struct Playing;

    #[test]
    fn updated_reports_update_target() {
        let lobby = StateKey::of::<Lobby>();
        let playing = StateKey::of::<Playing>();
        assert_eq!(TickOutcome::Idle.updated(), None);
        assert_eq!(TickOutcome::Updated { state: lobby }.updated(), Some(lobby));
        assert_eq!(
            TickOutcome::Rejected {
                pending: playing,
                updated: Some(lobby)
            }
            .updated(),
            Some(lobby)
        );
        let t = TickOutcome::Transitioned {
            from: Some(lobby),
            to: playing,
        };
        assert!(t.is_transition());
        assert_eq!(t.updated(), None);
        assert_eq!(t.to_string(), "Lobby -> Playing");
    }

    #[test]
    fn hook_error_keeps_source() {
        let err = TickError::Hook {
            arena: "a1".into(),
            phase: Phase::Update,
            state: StateKey::of::<Lobby>(),
            source: HookError::failed("scoreboard offline"),
        };
        assert_eq!(err.to_string(), "arena 'a1' update hook of Lobby failed");
        assert_eq!(err.source().unwrap().to_string(), "scoreboard offline");
    }
}
