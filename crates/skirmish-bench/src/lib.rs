//! Benchmark profiles for the Skirmish arena framework.
//!
//! - [`unit_chain`]: a linear parent chain with one feature at the root
//! - [`reference_arena`]: a ready two-state arena on top of an optional
//!   parent unit

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use skirmish_arena::{Arena, ArenaParts, GameState};
use skirmish_core::{ConfigError, HookError};
use skirmish_unit::{Feature, FeatureList, FeatureUnit, UnitConfig};

/// Feature placed at the root of a [`unit_chain`].
#[derive(Default)]
pub struct Payload {
    hits: AtomicU64,
}

impl Payload {
    /// Count one access.
    pub fn hit(&self) -> u64 {
        self.hits.fetch_add(1, Ordering::Relaxed)
    }
}

impl Feature for Payload {}

/// Waiting state of the reference arena.
#[derive(Default)]
pub struct Warmup {
    updates: AtomicU64,
}

impl GameState for Warmup {
    fn update(&self, _arena: &Arena) -> Result<(), HookError> {
        self.updates.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Active state of the reference arena. Touches the inherited
/// [`Payload`] on every update, if there is one.
#[derive(Default)]
pub struct Round;

impl GameState for Round {
    fn update(&self, arena: &Arena) -> Result<(), HookError> {
        if let Some(payload) = arena.feature::<Payload>() {
            payload.hit();
        }
        Ok(())
    }
}

/// Build `depth` units, each the parent of the next. Only the root owns
/// a [`Payload`]. The last element is the leaf.
pub fn unit_chain(depth: usize) -> Result<Vec<Arc<FeatureUnit>>, ConfigError> {
    let mut chain: Vec<Arc<FeatureUnit>> = Vec::with_capacity(depth);
    for i in 0..depth {
        let mut config = UnitConfig::new(format!("level-{i}"));
        let mut features = FeatureList::new();
        match chain.last() {
            Some(parent) => config = config.parent(Arc::clone(parent)),
            None => features = features.with(Payload::default()),
        }
        chain.push(Arc::new(FeatureUnit::new(config, features)?));
    }
    Ok(chain)
}

/// Build and initialize an arena with [`Warmup`] and [`Round`] states,
/// already in `Warmup`.
pub fn reference_arena(parent: Option<Arc<FeatureUnit>>) -> Result<Arena, Box<dyn Error>> {
    let mut config = UnitConfig::new("bench-arena");
    if let Some(parent) = parent {
        config = config.parent(parent);
    }
    let parts = ArenaParts::new()
        .state(Warmup::default())
        .state(Round);
    let arena = Arena::new(config, parts)?;
    arena.init()?;
    arena.post_init()?;
    arena.set_next_state::<Warmup>();
    arena.tick()?;
    Ok(arena)
}
