//! Skirmish arena loop: a tick driver thread plus players joining from
//! other threads.
//!
//! Demonstrates:
//!   1. A server unit whose features are shared by every arena under it
//!   2. An arena blueprint with a transition guard (no match until two
//!      players have joined)
//!   3. A driver thread calling `tick()` at a fixed rate
//!   4. Other threads requesting transitions with `set_next_state`
//!   5. Orderly teardown of the arena and its parent
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example arena_loop

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use skirmish::prelude::*;
use skirmish::types::Erased;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ─── Parameters ─────────────────────────────────────────────────

const TICK: Duration = Duration::from_millis(50);
const MIN_PLAYERS: u32 = 2;
const ROUND_TICKS: u32 = 10;

// ─── Server features ────────────────────────────────────────────

/// Players currently in the arena's lobby.
#[derive(Default)]
struct Roster {
    joined: AtomicU32,
}

impl Roster {
    fn join(&self) -> u32 {
        self.joined.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn count(&self) -> u32 {
        self.joined.load(Ordering::Relaxed)
    }
}

impl Feature for Roster {
    fn name(&self) -> &str {
        "roster"
    }
}

// ─── Game states ────────────────────────────────────────────────

struct Lobby;

impl GameState for Lobby {
    fn start(&self, arena: &Arena) -> Result<(), HookError> {
        info!(arena = %arena.name(), "waiting for players");
        Ok(())
    }
}

#[derive(Default)]
struct Playing {
    elapsed: AtomicU32,
}

impl GameState for Playing {
    fn start(&self, arena: &Arena) -> Result<(), HookError> {
        self.elapsed.store(0, Ordering::Relaxed);
        let players = arena.feature::<Roster>().map_or(0, |r| r.count());
        info!(arena = %arena.name(), players, "round started");
        Ok(())
    }

    fn update(&self, arena: &Arena) -> Result<(), HookError> {
        if self.elapsed.fetch_add(1, Ordering::Relaxed) + 1 == ROUND_TICKS {
            arena.set_next_state::<Ended>();
        }
        Ok(())
    }

    fn end(&self, arena: &Arena) -> Result<(), HookError> {
        info!(
            arena = %arena.name(),
            ticks = self.elapsed.load(Ordering::Relaxed),
            "round over"
        );
        Ok(())
    }
}

struct Ended;

impl GameState for Ended {}

// ─── Arena blueprint ────────────────────────────────────────────

struct Match;

impl ArenaBlueprint for Match {
    fn load_game_states(&self) -> Vec<Box<dyn GameState>> {
        vec![
            Box::new(Lobby),
            Box::new(Playing::default()),
            Box::new(Ended),
        ]
    }

    fn on_post_init(&self, arena: &Arena) -> Result<(), HookError> {
        arena.set_next_state::<Lobby>();
        Ok(())
    }

    fn on_state_change(
        &self,
        arena: &Arena,
        _old: Option<&dyn GameState>,
        new: &dyn GameState,
    ) -> Result<bool, HookError> {
        if Erased::type_key(new) != StateKey::of::<Playing>() {
            return Ok(true);
        }
        let players = arena.feature::<Roster>().map_or(0, |r| r.count());
        // A refused request stays pending and is re-checked every tick.
        Ok(players >= MIN_PLAYERS)
    }

    fn is_valid(&self, arena: &Arena) -> bool {
        arena.has_feature::<Roster>()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let server = Arc::new(FeatureUnit::new(
        UnitConfig::new("server"),
        FeatureList::new().with(Roster::default()),
    )?);
    let arena = Arc::new(Arena::new(
        UnitConfig::new("arena-1").parent(Arc::clone(&server)),
        Match,
    )?);
    arena.init()?;
    arena.post_init()?;
    info!(valid = arena.is_valid(), "{}", arena.status());

    // ─── Driver thread ──────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let driver = {
        let arena = Arc::clone(&arena);
        let running = Arc::clone(&running);
        thread::spawn(move || -> Result<(), TickError> {
            while running.load(Ordering::Relaxed) {
                let outcome = arena.tick()?;
                if outcome.is_transition() {
                    info!(%outcome, "transition");
                }
                thread::sleep(TICK);
            }
            Ok(())
        })
    };

    // ─── Players join from their own threads ────────────────────
    thread::sleep(TICK * 2);
    arena.set_next_state::<Playing>();
    for player in 0..MIN_PLAYERS {
        thread::sleep(TICK * 4);
        let server = Arc::clone(&server);
        thread::spawn(move || {
            if let Some(roster) = server.feature::<Roster>() {
                info!(player, joined = roster.join(), "player joined");
            }
        })
        .join()
        .map_err(|_| "player thread panicked")?;
    }

    while !arena.is_in::<Ended>() && !driver.is_finished() {
        thread::sleep(TICK);
    }
    running.store(false, Ordering::Relaxed);
    driver.join().map_err(|_| "driver thread panicked")??;

    info!("{}", arena.status());
    arena.clear()?;
    info!(server = %server.lifecycle(), "shut down");
    Ok(())
}
