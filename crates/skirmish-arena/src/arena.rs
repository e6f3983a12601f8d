//! [`Arena`]: a feature unit driving a game-state machine.
//!
//! # Tick algorithm
//!
//! 1. Resolve the current and next state handles to instances. A handle
//!    that names an undeclared type resolves to nothing.
//! 2. If a next-state instance exists, ask the guard
//!    ([`ArenaBlueprint::on_state_change`]).
//!    - Accepted: current becomes next, the next slot is emptied, `end`
//!      runs on the old state (if any), `start` on the new one, and the
//!      tick ends.
//!    - Rejected: neither slot is touched. The request stays pending and
//!      is offered to the guard again on every following tick until
//!      someone replaces or clears it.
//! 3. Without a transition, `update` runs on the current state (if any).
//!
//! There is no built-in state graph: any declared state may follow any
//! other.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use skirmish_core::{
    ConfigError, Erased, HookError, Lifecycle, LifecycleError, Phase, StateKey, TypeKey,
    TypeRegistry, UnitId,
};
use skirmish_unit::{Blueprint, Feature, FeatureUnit, UnitConfig};

use crate::slot::StateSlot;
use crate::state::GameState;
use crate::status::ArenaStatus;
use crate::tick::{TickError, TickOutcome};

// Compile-time assertion: Arena can be shared with setter threads.
const _: () = {
    #[allow(dead_code)]
    fn assert_send_sync<T: Send + Sync>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send_sync::<Arena>();
    }
};

/// Declarations and hooks of an arena.
///
/// `load_features` and `load_game_states` are called at most once,
/// during [`Arena::init`]. Every hook receives the arena so it can look
/// up features and request transitions.
pub trait ArenaBlueprint: Send + Sync + 'static {
    /// The features the arena owns.
    fn load_features(&self) -> Vec<Box<dyn Feature>> {
        Vec::new()
    }

    /// The states of the arena's state machine, one per type.
    fn load_game_states(&self) -> Vec<Box<dyn GameState>> {
        Vec::new()
    }

    /// Runs at the end of `init`, after features and states are loaded.
    fn on_init(&self, _arena: &Arena) -> Result<(), HookError> {
        Ok(())
    }

    /// Runs at the end of `post_init`.
    fn on_post_init(&self, _arena: &Arena) -> Result<(), HookError> {
        Ok(())
    }

    /// Runs first during `clear`, while features and states are present.
    fn on_clear(&self, _arena: &Arena) -> Result<(), HookError> {
        Ok(())
    }

    /// Transition guard, called when a pending request resolves to a
    /// declared state.
    ///
    /// Returning `Ok(true)` empties the next-state slot, dropping any
    /// request made while the guard ran.
    ///
    /// Return `Ok(false)` to cancel the transition. A cancelled request
    /// is **not** cleared: it is offered again on every following tick.
    /// To drop it, call [`Arena::clear_next_state`]; to redirect it,
    /// call [`Arena::set_next_state`] with another state before
    /// returning `false`.
    fn on_state_change(
        &self,
        _arena: &Arena,
        _old: Option<&dyn GameState>,
        _new: &dyn GameState,
    ) -> Result<bool, HookError> {
        Ok(true)
    }

    /// Whether the arena is fit to be registered with an arena manager.
    ///
    /// Never consulted by the arena itself.
    fn is_valid(&self, _arena: &Arena) -> bool {
        true
    }
}

/// An [`ArenaBlueprint`] built from fixed feature and state lists.
///
/// For arenas that need no hooks beyond what their states implement.
#[derive(Default)]
pub struct ArenaParts {
    features: Mutex<Vec<Box<dyn Feature>>>,
    states: Mutex<Vec<Box<dyn GameState>>>,
}

impl ArenaParts {
    /// No features, no states.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a feature.
    pub fn feature<F: Feature>(self, feature: F) -> Self {
        self.features.lock().push(Box::new(feature));
        self
    }

    /// Append a state.
    pub fn state<S: GameState>(self, state: S) -> Self {
        self.states.lock().push(Box::new(state));
        self
    }
}

impl ArenaBlueprint for ArenaParts {
    fn load_features(&self) -> Vec<Box<dyn Feature>> {
        std::mem::take(&mut *self.features.lock())
    }

    fn load_game_states(&self) -> Vec<Box<dyn GameState>> {
        std::mem::take(&mut *self.states.lock())
    }
}

/// Feeds the arena blueprint's features to the inner unit.
struct ArenaFeatures(Arc<dyn ArenaBlueprint>);

impl Blueprint for ArenaFeatures {
    fn load_features(&self) -> Vec<Box<dyn Feature>> {
        self.0.load_features()
    }
}

/// Resets the tick latch when a tick ends, including by error.
struct TickLatch<'a>(&'a AtomicBool);

impl Drop for TickLatch<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A feature unit with a tick-driven game-state machine.
///
/// Share it as `Arc<Arena>`: the tick driver calls [`tick`](Self::tick),
/// other threads call [`set_next_state`](Self::set_next_state) and read
/// [`status`](Self::status).
///
/// # Example
///
/// ```
/// use skirmish_arena::{Arena, ArenaParts, GameState, TickOutcome};
/// use skirmish_unit::UnitConfig;
///
/// struct Lobby;
/// impl GameState for Lobby {}
///
/// let arena = Arena::new(UnitConfig::new("arena-1"), ArenaParts::new().state(Lobby)).unwrap();
/// arena.init().unwrap();
/// arena.post_init().unwrap();
///
/// assert_eq!(arena.tick().unwrap(), TickOutcome::Idle);
/// arena.set_next_state::<Lobby>();
/// assert!(arena.tick().unwrap().is_transition());
/// assert!(arena.is_in::<Lobby>());
/// ```
pub struct Arena {
    unit: FeatureUnit,
    blueprint: Arc<dyn ArenaBlueprint>,
    states: RwLock<TypeRegistry<dyn GameState>>,
    current: StateSlot,
    next: StateSlot,
    ticking: AtomicBool,
    ticks: AtomicU64,
    transitions: AtomicU64,
}

impl Arena {
    /// Create an arena from a validated configuration.
    pub fn new(config: UnitConfig, blueprint: impl ArenaBlueprint) -> Result<Self, ConfigError> {
        Self::from_shared(config, Arc::new(blueprint))
    }

    /// Like [`new`](Self::new), for a blueprint already behind an `Arc`.
    pub fn from_shared(
        config: UnitConfig,
        blueprint: Arc<dyn ArenaBlueprint>,
    ) -> Result<Self, ConfigError> {
        let unit = FeatureUnit::new(config, ArenaFeatures(Arc::clone(&blueprint)))?;
        Ok(Self {
            unit,
            blueprint,
            states: RwLock::new(TypeRegistry::new()),
            current: StateSlot::new(),
            next: StateSlot::new(),
            ticking: AtomicBool::new(false),
            ticks: AtomicU64::new(0),
            transitions: AtomicU64::new(0),
        })
    }

    /// Process-unique identifier.
    pub fn id(&self) -> UnitId {
        self.unit.id()
    }

    /// Diagnostic name.
    pub fn name(&self) -> &str {
        self.unit.name()
    }

    /// Lifecycle phase.
    pub fn lifecycle(&self) -> Lifecycle {
        self.unit.lifecycle()
    }

    /// Parents in lookup order.
    pub fn parents(&self) -> &[Arc<FeatureUnit>] {
        self.unit.parents()
    }

    /// The underlying unit, for feature lookups.
    ///
    /// Drive the lifecycle through the arena, not through this unit:
    /// the unit alone does not load or clear game states.
    pub fn as_unit(&self) -> &FeatureUnit {
        &self.unit
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Initialize parents, features, then game states, then run
    /// [`ArenaBlueprint::on_init`].
    ///
    /// Same idempotence and failure rules as [`FeatureUnit::init`]; a
    /// duplicate state type fails with [`LifecycleError::DuplicateState`].
    pub fn init(&self) -> Result<(), LifecycleError> {
        self.unit.init_with(|unit| {
            let result = self.load_game_states(unit).and_then(|()| {
                self.blueprint
                    .on_init(self)
                    .map_err(|source| hook_failed(unit, Phase::Init, source))
            });
            // Only the call that loaded the states unloads them.
            if result.is_err() {
                self.states.write().drain();
            }
            result
        })
    }

    fn load_game_states(&self, unit: &FeatureUnit) -> Result<(), LifecycleError> {
        let mut registry: TypeRegistry<dyn GameState> = TypeRegistry::new();
        for state in self.blueprint.load_game_states() {
            let key = Erased::type_key(&*state);
            registry
                .insert(Arc::from(state))
                .map_err(|_| LifecycleError::DuplicateState {
                    unit: unit.name().to_string(),
                    state: key,
                })?;
        }
        debug!(arena = %unit.name(), states = registry.len(), "game states loaded");
        *self.states.write() = registry;
        Ok(())
    }

    /// Run the post-initialization phase, then
    /// [`ArenaBlueprint::on_post_init`].
    pub fn post_init(&self) -> Result<(), LifecycleError> {
        self.unit.post_init_with(|unit| {
            self.blueprint
                .on_post_init(self)
                .map_err(|source| hook_failed(unit, Phase::PostInit, source))
        })
    }

    /// Run [`ArenaBlueprint::on_clear`], drop the game states and both
    /// state slots, then clear the unit (features, then parents).
    pub fn clear(&self) -> Result<(), LifecycleError> {
        self.unit.clear_with(|unit| {
            let result = self
                .blueprint
                .on_clear(self)
                .map_err(|source| hook_failed(unit, Phase::Clear, source));
            self.states.write().drain();
            self.current.store(None);
            self.next.store(None);
            result
        })
    }

    /// Whether the arena is fit for registration; see
    /// [`ArenaBlueprint::is_valid`].
    pub fn is_valid(&self) -> bool {
        self.blueprint.is_valid(self)
    }

    // ── Tick ───────────────────────────────────────────────────────

    /// Advance the state machine by one step.
    ///
    /// See the [module documentation](self) for the algorithm. A second
    /// call while a tick is running (from another thread, or from inside
    /// a hook) fails with [`TickError::AlreadyTicking`] and changes
    /// nothing.
    pub fn tick(&self) -> Result<TickOutcome, TickError> {
        if self.ticking.swap(true, Ordering::AcqRel) {
            return Err(TickError::AlreadyTicking {
                arena: self.name().to_string(),
            });
        }
        let _latch = TickLatch(&self.ticking);
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.advance()
    }

    fn advance(&self) -> Result<TickOutcome, TickError> {
        let current_key = self.current.load();
        let current = current_key.and_then(|key| self.game_state_by_key(&key));
        let mut rejected = None;

        if let Some(next_key) = self.next.load() {
            match self.game_state_by_key(&next_key) {
                Some(next) => {
                    let accepted = self
                        .blueprint
                        .on_state_change(self, current.as_deref(), &*next)
                        .map_err(|source| self.tick_failed(Phase::StateChange, next_key, source))?;
                    if accepted {
                        let from = current.as_ref().and(current_key);
                        self.current.store(Some(next_key));
                        self.next.store(None);
                        self.transitions.fetch_add(1, Ordering::Relaxed);
                        debug!(
                            arena = %self.name(),
                            from = %from.map_or("none", |k| k.short_name()),
                            to = %next_key,
                            "state transition"
                        );
                        if let (Some(old), Some(old_key)) = (&current, from) {
                            old.end(self)
                                .map_err(|source| self.tick_failed(Phase::End, old_key, source))?;
                        }
                        next.start(self)
                            .map_err(|source| self.tick_failed(Phase::Start, next_key, source))?;
                        return Ok(TickOutcome::Transitioned { from, to: next_key });
                    }
                    trace!(arena = %self.name(), pending = %next_key, "transition rejected");
                    rejected = Some(next_key);
                }
                None => {
                    trace!(arena = %self.name(), pending = %next_key, "pending state not declared");
                }
            }
        }

        let updated = match (&current, current_key) {
            (Some(state), Some(key)) => {
                state
                    .update(self)
                    .map_err(|source| self.tick_failed(Phase::Update, key, source))?;
                Some(key)
            }
            _ => None,
        };

        Ok(match (rejected, updated) {
            (Some(pending), updated) => TickOutcome::Rejected { pending, updated },
            (None, Some(state)) => TickOutcome::Updated { state },
            (None, None) => TickOutcome::Idle,
        })
    }

    fn tick_failed(&self, phase: Phase, state: StateKey, source: HookError) -> TickError {
        TickError::Hook {
            arena: self.name().to_string(),
            phase,
            state,
            source,
        }
    }

    // ── State machine ──────────────────────────────────────────────

    /// The state that last received `start` without a matching `end`.
    pub fn current_state(&self) -> Option<StateKey> {
        self.current.load()
    }

    /// Instance of the current state.
    pub fn current_state_instance(&self) -> Option<Arc<dyn GameState>> {
        self.current_state()
            .and_then(|key| self.game_state_by_key(&key))
    }

    /// Whether the current state is `S`.
    pub fn is_in<S: GameState>(&self) -> bool {
        self.current_state() == Some(StateKey::of::<S>())
    }

    /// The pending transition request.
    pub fn next_state(&self) -> Option<StateKey> {
        self.next.load()
    }

    /// Instance of the pending request's state, if it is declared.
    pub fn next_state_instance(&self) -> Option<Arc<dyn GameState>> {
        self.next_state().and_then(|key| self.game_state_by_key(&key))
    }

    /// Request a transition to `S` on the next tick. Callable from any
    /// thread; replaces any earlier pending request.
    ///
    /// If `S` is not declared on this arena the request never resolves
    /// and simply stays pending.
    pub fn set_next_state<S: GameState>(&self) {
        self.request_state(StateKey::of::<S>());
    }

    /// [`set_next_state`](Self::set_next_state) by key.
    pub fn request_state(&self, key: StateKey) {
        trace!(arena = %self.name(), next = %key, "transition requested");
        self.next.store(Some(key));
    }

    /// Drop the pending request, if any.
    pub fn clear_next_state(&self) {
        self.next.store(None);
    }

    /// This arena's instance of state `S`.
    pub fn game_state<S: GameState>(&self) -> Option<Arc<S>> {
        self.states.read().get::<S>()
    }

    /// This arena's state instance for `key`.
    pub fn game_state_by_key(&self, key: &StateKey) -> Option<Arc<dyn GameState>> {
        self.states.read().get_by_key(key).cloned()
    }

    /// Declared state types, in declaration order.
    pub fn state_keys(&self) -> Vec<StateKey> {
        self.states.read().keys().collect()
    }

    // ── Features ───────────────────────────────────────────────────

    /// Find feature `T` on this arena or its ancestors.
    pub fn feature<T: Feature>(&self) -> Option<Arc<T>> {
        self.unit.feature::<T>()
    }

    /// Find feature `T` on this arena only.
    pub fn local_feature<T: Feature>(&self) -> Option<Arc<T>> {
        self.unit.local_feature::<T>()
    }

    /// Find a feature by key on this arena or its ancestors.
    pub fn feature_by_key(&self, key: &TypeKey) -> Option<Arc<dyn Feature>> {
        self.unit.feature_by_key(key)
    }

    /// Whether feature `T` is reachable from this arena.
    pub fn has_feature<T: Feature>(&self) -> bool {
        self.unit.has_feature::<T>()
    }

    /// This arena's own features.
    pub fn features(&self) -> Vec<Arc<dyn Feature>> {
        self.unit.features()
    }

    /// Keys of this arena's own features, in declaration order.
    pub fn feature_keys(&self) -> Vec<TypeKey> {
        self.unit.feature_keys()
    }

    // ── Status ─────────────────────────────────────────────────────

    /// Point-in-time status for external queries. Not synchronized with
    /// a tick in progress.
    pub fn status(&self) -> ArenaStatus {
        ArenaStatus {
            unit: self.id(),
            name: self.name().to_string(),
            lifecycle: self.lifecycle(),
            current: self.current_state(),
            next: self.next_state(),
            ticks: self.ticks.load(Ordering::Relaxed),
            transitions: self.transitions.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("unit", &self.unit)
            .field("states", &*self.states.read())
            .field("current", &self.current)
            .field("next", &self.next)
            .finish()
    }
}

fn hook_failed(unit: &FeatureUnit, phase: Phase, source: HookError) -> LifecycleError {
    LifecycleError::Hook {
        unit: unit.name().to_string(),
        phase,
        source,
    }
}
