//! [`FeatureUnit`]: dependency-ordered lifecycle and capability lookup.
//!
//! # Ordering guarantees
//!
//! - Every parent completes `init` before the child loads its own
//!   features. Parents are visited depth-first in list order; a parent
//!   shared by several children initializes once.
//! - `post_init` likewise runs parents first.
//! - `clear` runs the unit's own teardown before releasing its parents.
//!   A parent tears itself down when its last initialized dependent
//!   releases it, so a shared parent outlives every child that uses it.
//!
//! # Cycles
//!
//! Parents are fixed at construction and held by `Arc`, so a unit can
//! only name parents that already exist: the parent graph is a DAG by
//! construction. Re-entering `init` on a unit that is mid-`init` (from a
//! hook, or from a second thread) fails with
//! [`LifecycleError::InitInProgress`].
//!
//! # Extension
//!
//! Specializations such as the arena run extra work inside a lifecycle
//! phase through [`init_with`](FeatureUnit::init_with),
//! [`post_init_with`](FeatureUnit::post_init_with) and
//! [`clear_with`](FeatureUnit::clear_with). The extension runs inside
//! the phase, so a failure faults the unit the same way a failing
//! feature hook does.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use skirmish_core::{
    ConfigError, Erased, Lifecycle, LifecycleCell, LifecycleError, Phase, TypeKey, TypeRegistry,
    UnitId,
};

use crate::config::UnitConfig;
use crate::feature::{Blueprint, Feature};

/// A composable lifecycle node owning features and referring to parents.
///
/// Typically held in an `Arc` so it can serve as a parent of other
/// units. See the [module documentation](self) for ordering guarantees.
pub struct FeatureUnit {
    id: UnitId,
    name: String,
    parents: SmallVec<[Arc<FeatureUnit>; 2]>,
    blueprint: Box<dyn Blueprint>,
    lifecycle: LifecycleCell,
    features: RwLock<TypeRegistry<dyn Feature>>,
    /// Children that completed `init` and have not been cleared.
    dependents: AtomicUsize,
}

impl FeatureUnit {
    /// Create a unit from a validated configuration.
    ///
    /// Nothing is loaded until [`init`](Self::init).
    pub fn new(config: UnitConfig, blueprint: impl Blueprint) -> Result<Self, ConfigError> {
        Self::from_boxed(config, Box::new(blueprint))
    }

    /// Like [`new`](Self::new), for an already boxed blueprint.
    pub fn from_boxed(
        config: UnitConfig,
        blueprint: Box<dyn Blueprint>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            id: UnitId::next(),
            name: config.name,
            parents: config.parents.into_iter().collect(),
            blueprint,
            lifecycle: LifecycleCell::new(),
            features: RwLock::new(TypeRegistry::new()),
            dependents: AtomicUsize::new(0),
        })
    }

    /// Process-unique identifier.
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parents in lookup order.
    pub fn parents(&self) -> &[Arc<FeatureUnit>] {
        &self.parents
    }

    /// Current lifecycle phase.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.get()
    }

    /// Number of initialized children still holding this unit.
    pub fn dependents(&self) -> usize {
        self.dependents.load(Ordering::Acquire)
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Initialize parents, then load and initialize this unit's features.
    ///
    /// A unit that is already initialized (for instance a parent shared
    /// with a sibling that initialized first) returns `Ok` without doing
    /// anything. On failure the unit is left [`Lifecycle::Faulted`] and
    /// its features are dropped.
    pub fn init(&self) -> Result<(), LifecycleError> {
        self.init_with(|_| Ok(()))
    }

    /// [`init`](Self::init) with an extension that runs after the unit's
    /// own `on_init` hook, before the unit becomes `Initialized`.
    pub fn init_with<F>(&self, extension: F) -> Result<(), LifecycleError>
    where
        F: FnOnce(&FeatureUnit) -> Result<(), LifecycleError>,
    {
        match self
            .lifecycle
            .transition(Lifecycle::Uninitialized, Lifecycle::Initializing)
        {
            Ok(()) => {}
            Err(state) if state.is_live() => {
                trace!(unit = %self.name, %state, "init skipped, already initialized");
                return Ok(());
            }
            Err(Lifecycle::Initializing) => {
                return Err(LifecycleError::InitInProgress {
                    unit: self.name.clone(),
                });
            }
            Err(state) => return Err(self.invalid(Phase::Init, state)),
        }

        match self.load(extension) {
            Ok(()) => {
                for parent in &self.parents {
                    parent.dependents.fetch_add(1, Ordering::AcqRel);
                }
                self.lifecycle.set(Lifecycle::Initialized);
                debug!(
                    unit = %self.name,
                    parents = self.parents.len(),
                    features = self.features.read().len(),
                    "unit initialized"
                );
                Ok(())
            }
            Err(e) => {
                self.features.write().drain();
                self.lifecycle.set(Lifecycle::Faulted);
                warn!(unit = %self.name, error = %e, "unit init failed");
                Err(e)
            }
        }
    }

    fn load<F>(&self, extension: F) -> Result<(), LifecycleError>
    where
        F: FnOnce(&FeatureUnit) -> Result<(), LifecycleError>,
    {
        for parent in &self.parents {
            parent.init().map_err(|e| self.parent_failed(e))?;
        }

        let mut registry: TypeRegistry<dyn Feature> = TypeRegistry::new();
        for mut feature in self.blueprint.load_features() {
            let key = Erased::type_key(&*feature);
            if registry.contains(&key) {
                return Err(LifecycleError::DuplicateFeature {
                    unit: self.name.clone(),
                    feature: key,
                });
            }
            feature.init().map_err(|source| self.hook_failed(Phase::Init, source))?;
            trace!(unit = %self.name, feature = %key, "feature initialized");
            // Cannot collide: checked above.
            let _ = registry.insert(Arc::from(feature));
        }
        *self.features.write() = registry;

        self.blueprint
            .on_init(self)
            .map_err(|source| self.hook_failed(Phase::Init, source))?;
        extension(self)
    }

    /// Run the post-initialization phase, parents first.
    ///
    /// Must only be called once `init` has completed for the whole tree.
    /// A unit that is already [`Lifecycle::Ready`] returns `Ok`. On
    /// failure the unit goes back to `Initialized`.
    pub fn post_init(&self) -> Result<(), LifecycleError> {
        self.post_init_with(|_| Ok(()))
    }

    /// [`post_init`](Self::post_init) with an extension that runs after
    /// the unit's own `on_post_init` hook.
    pub fn post_init_with<F>(&self, extension: F) -> Result<(), LifecycleError>
    where
        F: FnOnce(&FeatureUnit) -> Result<(), LifecycleError>,
    {
        match self
            .lifecycle
            .transition(Lifecycle::Initialized, Lifecycle::PostInitializing)
        {
            Ok(()) => {}
            Err(Lifecycle::Ready) => return Ok(()),
            Err(state) => return Err(self.invalid(Phase::PostInit, state)),
        }

        match self.wire(extension) {
            Ok(()) => {
                self.lifecycle.set(Lifecycle::Ready);
                debug!(unit = %self.name, "unit ready");
                Ok(())
            }
            Err(e) => {
                self.lifecycle.set(Lifecycle::Initialized);
                warn!(unit = %self.name, error = %e, "unit post_init failed");
                Err(e)
            }
        }
    }

    fn wire<F>(&self, extension: F) -> Result<(), LifecycleError>
    where
        F: FnOnce(&FeatureUnit) -> Result<(), LifecycleError>,
    {
        for parent in &self.parents {
            parent.post_init().map_err(|e| self.parent_failed(e))?;
        }
        for feature in self.features() {
            feature
                .post_init(self)
                .map_err(|source| self.hook_failed(Phase::PostInit, source))?;
        }
        self.blueprint
            .on_post_init(self)
            .map_err(|source| self.hook_failed(Phase::PostInit, source))?;
        extension(self)
    }

    /// Tear the unit down, then release its parents.
    ///
    /// Teardown always runs to completion: every feature's `clear` hook
    /// is attempted and every parent is released even if an earlier hook
    /// failed. The first failure is returned.
    ///
    /// Clearing an uninitialized or faulted unit just marks it cleared.
    /// Clearing a cleared unit is a no-op.
    pub fn clear(&self) -> Result<(), LifecycleError> {
        self.clear_with(|_| Ok(()))
    }

    /// [`clear`](Self::clear) with an extension that runs first, before
    /// the unit's own `on_clear` hook.
    pub fn clear_with<F>(&self, extension: F) -> Result<(), LifecycleError>
    where
        F: FnOnce(&FeatureUnit) -> Result<(), LifecycleError>,
    {
        let state = self.lifecycle.get();
        match state {
            Lifecycle::Cleared => return Ok(()),
            Lifecycle::Uninitialized | Lifecycle::Faulted => {
                return match self.lifecycle.transition(state, Lifecycle::Cleared) {
                    Ok(()) => {
                        debug!(unit = %self.name, from = %state, "unit cleared without teardown");
                        Ok(())
                    }
                    Err(Lifecycle::Cleared) => Ok(()),
                    Err(observed) => Err(self.invalid(Phase::Clear, observed)),
                };
            }
            Lifecycle::Initialized | Lifecycle::Ready => {}
            _ => return Err(self.invalid(Phase::Clear, state)),
        }
        if let Err(observed) = self.lifecycle.transition(state, Lifecycle::Clearing) {
            return match observed {
                Lifecycle::Cleared => Ok(()),
                _ => Err(self.invalid(Phase::Clear, observed)),
            };
        }

        let live = self.dependents();
        if live > 0 {
            warn!(unit = %self.name, dependents = live, "clearing unit with live dependents");
        }

        let mut first_err = extension(self).err();
        if let Err(source) = self.blueprint.on_clear(self) {
            first_err.get_or_insert(self.hook_failed(Phase::Clear, source));
        }
        let features = self.features.write().drain();
        for feature in features.iter().rev() {
            if let Err(source) = feature.clear() {
                first_err.get_or_insert(self.hook_failed(Phase::Clear, source));
            }
        }
        drop(features);
        self.lifecycle.set(Lifecycle::Cleared);
        debug!(unit = %self.name, "unit cleared");

        for parent in &self.parents {
            if let Err(e) = parent.release() {
                first_err.get_or_insert(self.parent_failed(e));
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// A dependent was cleared; tear down once the last one is gone.
    fn release(&self) -> Result<(), LifecycleError> {
        let previous = self
            .dependents
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        match previous {
            Ok(1) => self.clear(),
            _ => Ok(()),
        }
    }

    // ── Lookup ─────────────────────────────────────────────────────

    /// Find the feature of type `T` on this unit or its ancestors.
    ///
    /// Searches the local registry first, then each parent in list order
    /// (each recursively). Absence is a normal outcome, including before
    /// `init`, after `clear` and on a faulted unit.
    pub fn feature<T: Feature>(&self) -> Option<Arc<T>> {
        if !self.serves_lookups() {
            return None;
        }
        let local = self.features.read().get::<T>();
        local.or_else(|| self.parents.iter().find_map(|p| p.feature::<T>()))
    }

    /// Find the feature of type `T` on this unit only.
    pub fn local_feature<T: Feature>(&self) -> Option<Arc<T>> {
        self.features.read().get::<T>()
    }

    /// Whether a feature of type `T` is reachable from this unit.
    pub fn has_feature<T: Feature>(&self) -> bool {
        self.feature_by_key(&TypeKey::of::<T>()).is_some()
    }

    /// Find a feature by key on this unit or its ancestors.
    pub fn feature_by_key(&self, key: &TypeKey) -> Option<Arc<dyn Feature>> {
        if !self.serves_lookups() {
            return None;
        }
        let local = self.features.read().get_by_key(key).cloned();
        local.or_else(|| self.parents.iter().find_map(|p| p.feature_by_key(key)))
    }

    /// This unit's own features, in declaration order.
    pub fn features(&self) -> Vec<Arc<dyn Feature>> {
        self.features.read().values().cloned().collect()
    }

    /// Keys of this unit's own features, in declaration order.
    pub fn feature_keys(&self) -> Vec<TypeKey> {
        self.features.read().keys().collect()
    }

    /// Lookups are served from the start of `init` until `clear` ends.
    fn serves_lookups(&self) -> bool {
        !matches!(
            self.lifecycle.get(),
            Lifecycle::Uninitialized | Lifecycle::Cleared | Lifecycle::Faulted
        )
    }

    // ── Errors ─────────────────────────────────────────────────────

    fn invalid(&self, phase: Phase, state: Lifecycle) -> LifecycleError {
        LifecycleError::InvalidState {
            unit: self.name.clone(),
            phase,
            state,
        }
    }

    fn hook_failed(&self, phase: Phase, source: skirmish_core::HookError) -> LifecycleError {
        LifecycleError::Hook {
            unit: self.name.clone(),
            phase,
            source,
        }
    }

    fn parent_failed(&self, source: LifecycleError) -> LifecycleError {
        LifecycleError::Parent {
            unit: self.name.clone(),
            source: Box::new(source),
        }
    }
}

impl fmt::Debug for FeatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureUnit")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("lifecycle", &self.lifecycle.get())
            .field("parents", &self.parents.len())
            .field("features", &*self.features.read())
            .finish()
    }
}
