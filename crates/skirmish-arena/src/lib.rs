//! Tick-driven game-state machine arenas.
//!
//! An [`Arena`] is a feature unit that additionally owns a set of
//! [`GameState`]s and advances a finite-state machine over them, one
//! [`tick`](Arena::tick) at a time.
//!
//! # Threading
//!
//! The core creates no threads. One driver per arena calls `tick()`
//! serially; all state hooks therefore run on that driver's thread. Any
//! thread may request a transition with
//! [`set_next_state`](Arena::set_next_state); the request is picked up
//! by the driver's next tick.
//!
//! ```text
//! any thread ──set_next_state──▶ StateSlot(next)
//!                                     │
//! driver ──tick()──▶ guard ──accept──▶ end(old) ▶ start(new)
//!                      └────reject──▶ update(current)
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod slot;
pub mod state;
pub mod status;
pub mod tick;

pub use arena::{Arena, ArenaBlueprint, ArenaParts};
pub use slot::StateSlot;
pub use state::GameState;
pub use status::ArenaStatus;
pub use tick::{TickError, TickOutcome};
