//! The [`Feature`] trait and the [`Blueprint`] declaration hooks.

use parking_lot::Mutex;
use skirmish_core::{Erased, HookError};

use crate::unit::FeatureUnit;

/// A capability attached to exactly one [`FeatureUnit`].
///
/// Features are identified by their concrete type: a unit holds at most
/// one instance of each feature type, and lookups name the type
/// (`unit.feature::<Scoreboard>()`).
///
/// # Contract
///
/// - `init` runs once, with exclusive access, before the feature is
///   published. Siblings are not visible yet.
/// - `post_init` runs once after the whole unit tree has completed
///   `init`; this is where cross-feature wiring belongs.
/// - `clear` runs once during teardown. Other handles to the feature may
///   still be alive, so it takes `&self`.
///
/// After `init` a feature is shared immutably across threads. Any state
/// it mutates later needs its own interior synchronization.
///
/// # Examples
///
/// ```
/// use skirmish_core::HookError;
/// use skirmish_unit::{Feature, FeatureList, FeatureUnit, UnitConfig};
///
/// struct MaxPlayers(u32);
///
/// impl Feature for MaxPlayers {
///     fn init(&mut self) -> Result<(), HookError> {
///         if self.0 == 0 {
///             return Err(HookError::failed("max players must be positive"));
///         }
///         Ok(())
///     }
/// }
///
/// let unit = FeatureUnit::new(
///     UnitConfig::new("rules"),
///     FeatureList::new().with(MaxPlayers(8)),
/// )
/// .unwrap();
/// unit.init().unwrap();
/// assert_eq!(unit.feature::<MaxPlayers>().unwrap().0, 8);
/// ```
pub trait Feature: Erased {
    /// Name for diagnostics and external introspection.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called once while the owning unit initializes.
    fn init(&mut self) -> Result<(), HookError> {
        Ok(())
    }

    /// Called once after every unit in the tree has initialized.
    fn post_init(&self, _unit: &FeatureUnit) -> Result<(), HookError> {
        Ok(())
    }

    /// Called once while the owning unit is cleared.
    fn clear(&self) -> Result<(), HookError> {
        Ok(())
    }
}

/// What a unit contributes, and the unit's own lifecycle hooks.
///
/// `load_features` is called at most once, during `init`, after every
/// parent has initialized. The returned order is the order features are
/// initialized in (and the reverse of the order they are cleared in).
pub trait Blueprint: Send + Sync + 'static {
    /// The features this unit owns.
    fn load_features(&self) -> Vec<Box<dyn Feature>> {
        Vec::new()
    }

    /// Runs after the unit's features are loaded and published.
    fn on_init(&self, _unit: &FeatureUnit) -> Result<(), HookError> {
        Ok(())
    }

    /// Runs after the features' own `post_init`.
    fn on_post_init(&self, _unit: &FeatureUnit) -> Result<(), HookError> {
        Ok(())
    }

    /// Runs first during `clear`, while every feature is still present.
    fn on_clear(&self, _unit: &FeatureUnit) -> Result<(), HookError> {
        Ok(())
    }
}

/// A [`Blueprint`] that hands over a fixed list of features.
///
/// For units that only group capabilities and need no hooks of their own.
#[derive(Default)]
pub struct FeatureList {
    pending: Mutex<Vec<Box<dyn Feature>>>,
}

impl FeatureList {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a feature.
    pub fn with<F: Feature>(self, feature: F) -> Self {
        self.pending.lock().push(Box::new(feature));
        self
    }

    /// Append an already boxed feature.
    pub fn with_boxed(self, feature: Box<dyn Feature>) -> Self {
        self.pending.lock().push(feature);
        self
    }

    /// Number of features not yet handed to a unit.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Whether the list is empty (or already handed over).
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

impl Blueprint for FeatureList {
    fn load_features(&self) -> Vec<Box<dyn Feature>> {
        std::mem::take(&mut *self.pending.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::TypeKey;

    struct Coins;
    impl Feature for Coins {}

    struct Named;
    impl Feature for Named {
        fn name(&self) -> &str {
            "named"
        }
    }

    #[test]
    fn default_name_is_type_name() {
        let f: Box<dyn Feature> = Box::new(Coins);
        assert!(f.name().ends_with("Coins"));
        let g: Box<dyn Feature> = Box::new(Named);
        assert_eq!(g.name(), "named");
    }

    #[test]
    fn feature_list_hands_over_once() {
        let list = FeatureList::new().with(Coins).with(Named);
        assert_eq!(list.len(), 2);

        let first = list.load_features();
        assert_eq!(first.len(), 2);
        assert_eq!(Erased::type_key(&*first[0]), TypeKey::of::<Coins>());
        assert!(list.load_features().is_empty());
        assert!(list.is_empty());
    }
}
