//! The per-unit lifecycle marker.
//!
//! [`LifecycleCell`] stores a [`Lifecycle`] in an atomic byte so that
//! phase transitions can be claimed with compare-and-swap. A unit that
//! loses the claim (because another caller is mid-phase) sees the state
//! the winner left behind and reports it instead of running the phase
//! twice.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle phase of a feature unit.
///
/// The happy path is
/// `Uninitialized → Initializing → Initialized → PostInitializing →
/// Ready → Clearing → Cleared`. `Faulted` is entered when a hook fails
/// during `init` and is left only by `clear`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Lifecycle {
    /// Constructed; nothing loaded.
    Uninitialized = 0,
    /// `init` is running (parents, then own declarations).
    Initializing = 1,
    /// Own features loaded and published; lookups are served.
    Initialized = 2,
    /// `post_init` is running.
    PostInitializing = 3,
    /// `post_init` completed; the unit is fully wired.
    Ready = 4,
    /// `clear` is running.
    Clearing = 5,
    /// Torn down. Terminal.
    Cleared = 6,
    /// A hook failed during `init`.
    Faulted = 7,
}

impl Lifecycle {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Uninitialized,
            1 => Self::Initializing,
            2 => Self::Initialized,
            3 => Self::PostInitializing,
            4 => Self::Ready,
            5 => Self::Clearing,
            6 => Self::Cleared,
            _ => Self::Faulted,
        }
    }

    /// Whether the unit's own registry is published (`Initialized`,
    /// `PostInitializing` or `Ready`).
    pub fn is_live(self) -> bool {
        matches!(
            self,
            Self::Initialized | Self::PostInitializing | Self::Ready
        )
    }

    /// Whether the unit can never run a lifecycle phase again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cleared | Self::Faulted)
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Initialized => "initialized",
            Self::PostInitializing => "post-initializing",
            Self::Ready => "ready",
            Self::Clearing => "clearing",
            Self::Cleared => "cleared",
            Self::Faulted => "faulted",
        };
        f.write_str(s)
    }
}

/// Atomic holder for a [`Lifecycle`].
#[derive(Debug)]
pub struct LifecycleCell(AtomicU8);

impl LifecycleCell {
    /// A cell in [`Lifecycle::Uninitialized`].
    pub fn new() -> Self {
        Self(AtomicU8::new(Lifecycle::Uninitialized as u8))
    }

    /// Current phase.
    pub fn get(&self) -> Lifecycle {
        Lifecycle::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Unconditionally move to `to`.
    pub fn set(&self, to: Lifecycle) {
        self.0.store(to as u8, Ordering::Release);
    }

    /// Move from `from` to `to` if the cell currently holds `from`.
    ///
    /// On failure returns the phase actually observed.
    pub fn transition(&self, from: Lifecycle, to: Lifecycle) -> Result<(), Lifecycle> {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(Lifecycle::from_u8)
    }
}

impl Default for LifecycleCell {
    fn default() -> Self {
        Self::new()
    }
}
