//! Type-keyed registry holding one shared instance per concrete type.
//!
//! [`TypeRegistry`] backs both the feature registry of a unit and the
//! game-state registry of an arena. Entries keep declaration order
//! (`IndexMap`), which is the order lifecycle hooks run in.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::id::{Erased, TypeKey};

/// A second value of an already registered type was inserted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DuplicateKey(pub TypeKey);

impl fmt::Display for DuplicateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type {} registered twice", self.0)
    }
}

impl std::error::Error for DuplicateKey {}

/// Maps each concrete type to the single instance of it.
///
/// `V` is a trait object extending [`Erased`] (`dyn Feature`,
/// `dyn GameState`); values are keyed by the concrete type behind the
/// object, not by `V`.
pub struct TypeRegistry<V: ?Sized + Erased> {
    entries: IndexMap<TypeKey, Arc<V>>,
}

impl<V: ?Sized + Erased> TypeRegistry<V> {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Register `value` under its concrete type.
    ///
    /// Rejects a second instance of a type that is already present; the
    /// registry is left unchanged in that case.
    pub fn insert(&mut self, value: Arc<V>) -> Result<TypeKey, DuplicateKey> {
        let key = Erased::type_key(&*value);
        if self.entries.contains_key(&key) {
            return Err(DuplicateKey(key));
        }
        self.entries.insert(key, value);
        Ok(key)
    }

    /// The instance registered for `key`.
    pub fn get_by_key(&self, key: &TypeKey) -> Option<&Arc<V>> {
        self.entries.get(key)
    }

    /// The instance of concrete type `T`, downcast.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let value = self.entries.get(&TypeKey::of::<T>())?;
        Erased::into_any(Arc::clone(value)).downcast::<T>().ok()
    }

    /// Whether an instance of `key` is registered.
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Registered keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.entries.keys().copied()
    }

    /// Registered values in declaration order.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &Arc<V>> + '_ {
        self.entries.values()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return every value, in declaration order.
    pub fn drain(&mut self) -> Vec<Arc<V>> {
        self.entries.drain(..).map(|(_, v)| v).collect()
    }
}

impl<V: ?Sized + Erased> Default for TypeRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: ?Sized + Erased> fmt::Debug for TypeRegistry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}
