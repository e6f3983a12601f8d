//! The [`GameState`] trait.

use skirmish_core::{Erased, HookError};

use crate::arena::Arena;

/// One state of an arena's state machine.
///
/// A state is identified by its concrete type: each arena holds exactly
/// one instance per declared state type, and transitions name the type
/// (`arena.set_next_state::<Playing>()`).
///
/// # Hook contract
///
/// - `start` runs exactly once per transition into the state.
/// - `end` runs exactly once per transition out of it. The very first
///   transition of an arena has no previous state, so no `end` runs.
/// - `update` runs on every tick in which no transition happens.
///
/// Hooks run on the arena's tick driver, never concurrently with each
/// other for the same arena, so a state needs no locking for data only
/// its hooks touch. A transition requested from inside a hook is
/// evaluated on a later tick.
///
/// An `Err` aborts the rest of the tick and is returned by
/// [`Arena::tick`].
pub trait GameState: Erased {
    /// Name for diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called when the arena enters this state.
    fn start(&self, _arena: &Arena) -> Result<(), HookError> {
        Ok(())
    }

    /// Called on every tick spent in this state without a transition.
    fn update(&self, _arena: &Arena) -> Result<(), HookError> {
        Ok(())
    }

    /// Called when the arena leaves this state.
    fn end(&self, _arena: &Arena) -> Result<(), HookError> {
        Ok(())
    }
}
