//! Skirmish: feature units and tick-driven game-state arenas.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Skirmish sub-crates. For most users, adding `skirmish` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use skirmish::prelude::*;
//!
//! // Shared by every arena on the server.
//! struct MaxPlayers(u32);
//! impl Feature for MaxPlayers {}
//!
//! struct Lobby;
//! impl GameState for Lobby {
//!     fn update(&self, arena: &Arena) -> Result<(), HookError> {
//!         if arena.feature::<MaxPlayers>().map_or(0, |m| m.0) > 0 {
//!             arena.set_next_state::<Playing>();
//!         }
//!         Ok(())
//!     }
//! }
//!
//! struct Playing;
//! impl GameState for Playing {}
//!
//! let server = Arc::new(
//!     FeatureUnit::new(UnitConfig::new("server"), FeatureList::new().with(MaxPlayers(8)))
//!         .unwrap(),
//! );
//! let arena = Arena::new(
//!     UnitConfig::new("arena-1").parent(server),
//!     ArenaParts::new().state(Lobby).state(Playing),
//! )
//! .unwrap();
//! arena.init().unwrap();
//! arena.post_init().unwrap();
//!
//! arena.set_next_state::<Lobby>();
//! arena.tick().unwrap(); // enter Lobby
//! arena.tick().unwrap(); // Lobby requests Playing
//! arena.tick().unwrap(); // enter Playing
//! assert!(arena.is_in::<Playing>());
//! arena.clear().unwrap();
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `skirmish-core` | Type keys, IDs, lifecycle, registry, errors |
//! | [`unit`] | `skirmish-unit` | `FeatureUnit`, `Feature`, `Blueprint`, `UnitConfig` |
//! | [`arena`] | `skirmish-arena` | `Arena`, `GameState`, tick outcomes and status |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and errors (`skirmish-core`).
///
/// Contains [`types::TypeKey`], [`types::UnitId`], the
/// [`types::Lifecycle`] marker, the type-keyed [`types::TypeRegistry`]
/// and the error taxonomy.
pub use skirmish_core as types;

/// Feature units (`skirmish-unit`).
///
/// [`unit::FeatureUnit`] is the lifecycle node; [`unit::Feature`] and
/// [`unit::Blueprint`] are the extension points.
pub use skirmish_unit as unit;

/// Game-state arenas (`skirmish-arena`).
///
/// [`arena::Arena`] drives a state machine over [`arena::GameState`]s,
/// guarded by [`arena::ArenaBlueprint::on_state_change`].
pub use skirmish_arena as arena;

/// Common imports for typical Skirmish usage.
///
/// ```rust
/// use skirmish::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use skirmish_core::{Lifecycle, StateKey, TypeKey, UnitId};

    // Errors
    pub use skirmish_core::{ConfigError, HookError, LifecycleError, Phase};

    // Units
    pub use skirmish_unit::{Blueprint, Feature, FeatureList, FeatureUnit, UnitConfig};

    // Arenas
    pub use skirmish_arena::{
        Arena, ArenaBlueprint, ArenaParts, ArenaStatus, GameState, TickError, TickOutcome,
    };
}
