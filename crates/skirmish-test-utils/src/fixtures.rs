//! Recording fixtures for units, arenas, features and game states.
//!
//! Log entries have the form `"<hook>:<name>"`:
//!
//! - features: `init:Alpha`, `post_init:Alpha`, `clear:Alpha`
//! - unit blueprints: `on_init:<tag>`, `on_post_init:<tag>`, `on_clear:<tag>`
//! - states: `start:Lobby`, `update:Lobby`, `end:Lobby`
//! - arena guard: `guard:Lobby->Playing` (`none` when there is no
//!   current state)

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use skirmish_arena::{Arena, ArenaBlueprint, GameState};
use skirmish_core::{Erased, HookError, Phase, StateKey};
use skirmish_unit::{Blueprint, Feature, FeatureUnit};

use crate::CallLog;

fn fail_if(fail_on: Option<Phase>, phase: Phase, name: &str) -> Result<(), HookError> {
    if fail_on == Some(phase) {
        return Err(HookError::failed(format!("{name} failed in {phase}")));
    }
    Ok(())
}

// ── Features ───────────────────────────────────────────────────────

macro_rules! recording_features {
    ($($name:ident),* $(,)?) => {$(
        /// Feature that records its lifecycle hooks.
        pub struct $name {
            log: CallLog,
        }

        impl $name {
            pub fn new(log: &CallLog) -> Self {
                Self { log: log.clone() }
            }
        }

        impl Feature for $name {
            fn name(&self) -> &str {
                stringify!($name)
            }

            fn init(&mut self) -> Result<(), HookError> {
                self.log.record(concat!("init:", stringify!($name)));
                Ok(())
            }

            fn post_init(&self, _unit: &FeatureUnit) -> Result<(), HookError> {
                self.log.record(concat!("post_init:", stringify!($name)));
                Ok(())
            }

            fn clear(&self) -> Result<(), HookError> {
                self.log.record(concat!("clear:", stringify!($name)));
                Ok(())
            }
        }
    )*};
}

recording_features!(Alpha, Beta, Gamma);

/// Feature that fails in one chosen phase and records every hook it
/// reaches.
pub struct FailingFeature {
    log: CallLog,
    fail_on: Phase,
}

impl FailingFeature {
    pub fn new(log: &CallLog, fail_on: Phase) -> Self {
        Self {
            log: log.clone(),
            fail_on,
        }
    }
}

impl Feature for FailingFeature {
    fn name(&self) -> &str {
        "FailingFeature"
    }

    fn init(&mut self) -> Result<(), HookError> {
        self.log.record("init:FailingFeature");
        fail_if(Some(self.fail_on), Phase::Init, "FailingFeature")
    }

    fn post_init(&self, _unit: &FeatureUnit) -> Result<(), HookError> {
        self.log.record("post_init:FailingFeature");
        fail_if(Some(self.fail_on), Phase::PostInit, "FailingFeature")
    }

    fn clear(&self) -> Result<(), HookError> {
        self.log.record("clear:FailingFeature");
        fail_if(Some(self.fail_on), Phase::Clear, "FailingFeature")
    }
}

/// Shared counter feature with interior mutability.
#[derive(Default)]
pub struct Scoreboard {
    points: AtomicU64,
}

impl Scoreboard {
    pub fn add(&self, points: u64) -> u64 {
        self.points.fetch_add(points, Ordering::Relaxed) + points
    }

    pub fn points(&self) -> u64 {
        self.points.load(Ordering::Relaxed)
    }
}

impl Feature for Scoreboard {}

// ── Unit blueprint ─────────────────────────────────────────────────

/// Unit blueprint that hands over its features once and records its own
/// hooks under `tag`.
pub struct RecordingUnit {
    tag: String,
    log: CallLog,
    features: Mutex<Vec<Box<dyn Feature>>>,
    fail_on: Option<Phase>,
}

impl RecordingUnit {
    pub fn new(tag: impl Into<String>, log: &CallLog) -> Self {
        Self {
            tag: tag.into(),
            log: log.clone(),
            features: Mutex::new(Vec::new()),
            fail_on: None,
        }
    }

    pub fn with<F: Feature>(self, feature: F) -> Self {
        self.features.lock().push(Box::new(feature));
        self
    }

    /// Make the unit's own hook fail in `phase`.
    pub fn failing(mut self, phase: Phase) -> Self {
        self.fail_on = Some(phase);
        self
    }

    fn hook(&self, hook: &str, phase: Phase) -> Result<(), HookError> {
        self.log.record(format!("{hook}:{}", self.tag));
        fail_if(self.fail_on, phase, &self.tag)
    }
}

impl Blueprint for RecordingUnit {
    fn load_features(&self) -> Vec<Box<dyn Feature>> {
        std::mem::take(&mut *self.features.lock())
    }

    fn on_init(&self, _unit: &FeatureUnit) -> Result<(), HookError> {
        self.hook("on_init", Phase::Init)
    }

    fn on_post_init(&self, _unit: &FeatureUnit) -> Result<(), HookError> {
        self.hook("on_post_init", Phase::PostInit)
    }

    fn on_clear(&self, _unit: &FeatureUnit) -> Result<(), HookError> {
        self.hook("on_clear", Phase::Clear)
    }
}

// ── Game states ────────────────────────────────────────────────────

macro_rules! recording_states {
    ($($name:ident),* $(,)?) => {$(
        /// Game state that records its hooks.
        pub struct $name {
            log: CallLog,
        }

        impl $name {
            pub fn new(log: &CallLog) -> Self {
                Self { log: log.clone() }
            }
        }

        impl GameState for $name {
            fn name(&self) -> &str {
                stringify!($name)
            }

            fn start(&self, _arena: &Arena) -> Result<(), HookError> {
                self.log.record(concat!("start:", stringify!($name)));
                Ok(())
            }

            fn update(&self, _arena: &Arena) -> Result<(), HookError> {
                self.log.record(concat!("update:", stringify!($name)));
                Ok(())
            }

            fn end(&self, _arena: &Arena) -> Result<(), HookError> {
                self.log.record(concat!("end:", stringify!($name)));
                Ok(())
            }
        }
    )*};
}

recording_states!(Lobby, Playing, Ended);

/// Game state that fails in one chosen tick phase.
pub struct FailingState {
    log: CallLog,
    fail_on: Phase,
}

impl FailingState {
    pub fn new(log: &CallLog, fail_on: Phase) -> Self {
        Self {
            log: log.clone(),
            fail_on,
        }
    }
}

impl GameState for FailingState {
    fn name(&self) -> &str {
        "FailingState"
    }

    fn start(&self, _arena: &Arena) -> Result<(), HookError> {
        self.log.record("start:FailingState");
        fail_if(Some(self.fail_on), Phase::Start, "FailingState")
    }

    fn update(&self, _arena: &Arena) -> Result<(), HookError> {
        self.log.record("update:FailingState");
        fail_if(Some(self.fail_on), Phase::Update, "FailingState")
    }

    fn end(&self, _arena: &Arena) -> Result<(), HookError> {
        self.log.record("end:FailingState");
        fail_if(Some(self.fail_on), Phase::End, "FailingState")
    }
}

/// Game state whose `update` requests a transition to `S`.
pub struct Requesting<S> {
    log: CallLog,
    _next: std::marker::PhantomData<fn() -> S>,
}

impl<S> Requesting<S> {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            _next: std::marker::PhantomData,
        }
    }
}

impl<S: GameState> GameState for Requesting<S> {
    fn name(&self) -> &str {
        "Requesting"
    }

    fn update(&self, arena: &Arena) -> Result<(), HookError> {
        self.log.record("update:Requesting");
        arena.set_next_state::<S>();
        Ok(())
    }
}

// ── Arena blueprint ────────────────────────────────────────────────

/// Transition guard: `(arena, current, proposed) -> accept`.
pub type Guard = dyn Fn(&Arena, Option<StateKey>, StateKey) -> bool + Send + Sync;

/// Scriptable arena blueprint.
///
/// Records its lifecycle hooks as `on_init:arena` (and so on) and every
/// guard call. Accepts every transition unless a guard is installed.
pub struct RecordingArena {
    log: CallLog,
    features: Mutex<Vec<Box<dyn Feature>>>,
    states: Mutex<Vec<Box<dyn GameState>>>,
    guard: Option<Box<Guard>>,
    fail_on: Option<Phase>,
    valid: AtomicBool,
}

impl RecordingArena {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            features: Mutex::new(Vec::new()),
            states: Mutex::new(Vec::new()),
            guard: None,
            fail_on: None,
            valid: AtomicBool::new(true),
        }
    }

    /// Arena with the recording `Lobby`, `Playing` and `Ended` states.
    pub fn standard(log: &CallLog) -> Self {
        Self::new(log)
            .state(Lobby::new(log))
            .state(Playing::new(log))
            .state(Ended::new(log))
    }

    pub fn feature<F: Feature>(self, feature: F) -> Self {
        self.features.lock().push(Box::new(feature));
        self
    }

    pub fn state<S: GameState>(self, state: S) -> Self {
        self.states.lock().push(Box::new(state));
        self
    }

    pub fn guard(
        mut self,
        guard: impl Fn(&Arena, Option<StateKey>, StateKey) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.guard = Some(Box::new(guard));
        self
    }

    /// Make the arena's own hook fail in `phase`. `Phase::StateChange`
    /// makes the guard fail.
    pub fn failing(mut self, phase: Phase) -> Self {
        self.fail_on = Some(phase);
        self
    }

    pub fn set_valid(&self, valid: bool) {
        self.valid.store(valid, Ordering::Relaxed);
    }
}

impl ArenaBlueprint for RecordingArena {
    fn load_features(&self) -> Vec<Box<dyn Feature>> {
        std::mem::take(&mut *self.features.lock())
    }

    fn load_game_states(&self) -> Vec<Box<dyn GameState>> {
        std::mem::take(&mut *self.states.lock())
    }

    fn on_init(&self, _arena: &Arena) -> Result<(), HookError> {
        self.log.record("on_init:arena");
        fail_if(self.fail_on, Phase::Init, "arena")
    }

    fn on_post_init(&self, _arena: &Arena) -> Result<(), HookError> {
        self.log.record("on_post_init:arena");
        fail_if(self.fail_on, Phase::PostInit, "arena")
    }

    fn on_clear(&self, _arena: &Arena) -> Result<(), HookError> {
        self.log.record("on_clear:arena");
        fail_if(self.fail_on, Phase::Clear, "arena")
    }

    fn on_state_change(
        &self,
        arena: &Arena,
        old: Option<&dyn GameState>,
        new: &dyn GameState,
    ) -> Result<bool, HookError> {
        self.log.record(format!(
            "guard:{}->{}",
            old.map_or("none", |s| s.name()),
            new.name()
        ));
        fail_if(self.fail_on, Phase::StateChange, "arena")?;
        let accepted = match &self.guard {
            Some(guard) => guard(
                arena,
                old.map(|s| Erased::type_key(s)),
                Erased::type_key(new),
            ),
            None => true,
        };
        Ok(accepted)
    }

    fn is_valid(&self, _arena: &Arena) -> bool {
        self.valid.load(Ordering::Relaxed)
    }
}
