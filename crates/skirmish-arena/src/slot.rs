//! [`StateSlot`]: a shared cell holding an optional [`StateKey`].
//!
//! The arena keeps its current and next state in two slots. Writers on
//! any thread publish with [`store`](StateSlot::store); the tick driver
//! polls with [`load`](StateSlot::load) once per tick. The critical
//! section is a copy of a few words, so a writer never waits on a tick
//! in progress, only on another load or store.
//!
//! Reads are not transactional with respect to the tick: a status query
//! may see a value that the driver is about to replace.

use std::fmt;

use parking_lot::Mutex;
use skirmish_core::StateKey;

/// Cell holding an optional state handle.
#[derive(Default)]
pub struct StateSlot {
    value: Mutex<Option<StateKey>>,
}

impl StateSlot {
    /// An empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value.
    pub fn load(&self) -> Option<StateKey> {
        *self.value.lock()
    }

    /// Replace the value.
    pub fn store(&self, key: Option<StateKey>) {
        *self.value.lock() = key;
    }

}

impl fmt::Debug for StateSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StateSlot").field(&self.load()).finish()
    }
}
