//! Error types for the Skirmish framework.
//!
//! Organized by where the failure surfaces: construction
//! ([`ConfigError`]), the three-phase lifecycle ([`LifecycleError`]),
//! and user hooks ([`HookError`]). Tick failures live next to the tick
//! routine in `skirmish-arena`.
//!
//! Capability absence and rejected transitions are not errors; they are
//! reported through `Option` and the tick outcome.

use std::fmt;

use thiserror::Error;

use crate::id::TypeKey;
use crate::lifecycle::Lifecycle;

/// A lifecycle or tick hook that can fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Feature or unit `init`.
    Init,
    /// Feature or unit `post_init`.
    PostInit,
    /// Feature or unit `clear`.
    Clear,
    /// The transition guard.
    StateChange,
    /// `GameState::start`.
    Start,
    /// `GameState::update`.
    Update,
    /// `GameState::end`.
    End,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Init => "init",
            Self::PostInit => "post_init",
            Self::Clear => "clear",
            Self::StateChange => "state_change",
            Self::Start => "start",
            Self::Update => "update",
            Self::End => "end",
        };
        f.write_str(s)
    }
}

/// A failure raised by user code inside a hook.
///
/// The framework never suppresses these; it wraps them with the unit and
/// phase and hands them back to whoever drove the lifecycle or tick.
#[derive(Debug, Error)]
pub enum HookError {
    /// The hook failed with a plain message.
    #[error("{reason}")]
    Failed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The hook failed with an underlying error.
    #[error(transparent)]
    Source(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HookError {
    /// Shorthand for [`HookError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

/// Errors detected while validating a unit configuration.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The unit name is empty or whitespace.
    #[error("unit name must not be empty")]
    EmptyName,
    /// The same parent instance appears twice in the parent list.
    #[error("unit '{unit}' lists parent '{parent}' more than once")]
    DuplicateParent {
        /// The unit being configured.
        unit: String,
        /// Name of the repeated parent.
        parent: String,
    },
}

/// Errors from `init`, `post_init` and `clear`.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// `init` was entered on a unit whose `init` is still running.
    ///
    /// Happens when two threads initialize the same unit at once, or
    /// when a hook re-enters `init` on its own unit.
    #[error("unit '{unit}' is already initializing")]
    InitInProgress {
        /// The re-entered unit.
        unit: String,
    },
    /// A phase was requested from a lifecycle state that does not allow it.
    #[error("unit '{unit}' cannot run {phase} while {state}")]
    InvalidState {
        /// The unit.
        unit: String,
        /// The requested phase.
        phase: Phase,
        /// The state the unit was in.
        state: Lifecycle,
    },
    /// Two features of the same concrete type were declared on one unit.
    #[error("unit '{unit}' declares feature {feature} more than once")]
    DuplicateFeature {
        /// The unit.
        unit: String,
        /// The repeated type.
        feature: TypeKey,
    },
    /// Two game states of the same concrete type were declared on one arena.
    #[error("arena '{unit}' declares game state {state} more than once")]
    DuplicateState {
        /// The arena.
        unit: String,
        /// The repeated type.
        state: TypeKey,
    },
    /// A parent failed its own lifecycle phase.
    #[error("parent of unit '{unit}' failed")]
    Parent {
        /// The child whose parent failed.
        unit: String,
        /// The parent's error.
        #[source]
        source: Box<LifecycleError>,
    },
    /// A hook failed.
    #[error("unit '{unit}' {phase} hook failed")]
    Hook {
        /// The unit whose hook failed.
        unit: String,
        /// Which hook.
        phase: Phase,
        /// The hook's error.
        #[source]
        source: HookError,
    },
}

impl LifecycleError {
    /// The innermost unit-level cause, following `Parent` links.
    pub fn root_cause(&self) -> &LifecycleError {
        match self {
            Self::Parent { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
