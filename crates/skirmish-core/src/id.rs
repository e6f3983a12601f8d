//! Strongly-typed identifiers: [`TypeKey`], [`StateKey`] and [`UnitId`].

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifies a concrete Rust type used as a registry key.
///
/// Features and game states are identified by their concrete type, not
/// by instance. Equality and hashing use the [`TypeId`] only; the type
/// name is carried for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// The key for type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying [`TypeId`].
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name with the module path stripped (`a::b::Lobby` → `Lobby`).
    ///
    /// Generic arguments are kept as written.
    pub fn short_name(&self) -> &'static str {
        let base = match self.name.find('<') {
            Some(i) => &self.name[..i],
            None => self.name,
        };
        let start = base.rfind("::").map(|i| i + 2).unwrap_or(0);
        &self.name[start..]
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Handle naming a game state by its concrete type.
///
/// An arena's current and next state are stored as `StateKey`s and
/// resolved to the live instance through the arena's state registry.
pub type StateKey = TypeKey;

/// Type erasure for registry values.
///
/// Blanket-implemented for every sized `Any + Send + Sync` type, so
/// trait objects that extend it (`dyn Feature`, `dyn GameState`) can
/// report their concrete key and be downcast back to the concrete type.
///
/// Call these through the trait object (`Erased::type_key(&*value)`),
/// not through a smart pointer, so the concrete implementation is
/// selected by the vtable.
pub trait Erased: Any + Send + Sync {
    /// Key of the concrete type behind this value.
    fn type_key(&self) -> TypeKey;

    /// Convert a shared handle into `Arc<dyn Any>` for downcasting.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> Erased for T {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Counter for unique [`UnitId`] allocation.
static UNIT_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for a feature unit or arena.
///
/// Allocated from a monotonic atomic counter via [`UnitId::next`]. Two
/// units never share an ID within a process, even when they carry the
/// same name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u64);

impl UnitId {
    /// Allocate a fresh, unique ID. Thread-safe.
    pub fn next() -> Self {
        Self(UNIT_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod lobby {
        pub struct Lobby;
        pub struct Wrapper<T>(pub T);
    }

    #[test]
    fn keys_compare_by_type() {
        assert_eq!(TypeKey::of::<u32>(), TypeKey::of::<u32>());
        assert_ne!(TypeKey::of::<u32>(), TypeKey::of::<u64>());
    }

    #[test]
    fn short_name_strips_module_path() {
        assert_eq!(TypeKey::of::<lobby::Lobby>().short_name(), "Lobby");
        assert_eq!(TypeKey::of::<u8>().short_name(), "u8");
        assert!(TypeKey::of::<lobby::Wrapper<u8>>()
            .short_name()
            .starts_with("Wrapper<"));
    }

    #[test]
    fn erased_reports_concrete_key_through_trait_object() {
        let boxed: Box<dyn Erased> = Box::new(lobby::Lobby);
        assert_eq!(Erased::type_key(&*boxed), TypeKey::of::<lobby::Lobby>());

        let shared: Arc<dyn Erased> = Arc::new(7u16);
        let any = Erased::into_any(shared);
        assert_eq!(*any.downcast::<u16>().unwrap(), 7);
    }

    #[test]
    fn unit_ids_are_unique() {
        let a = UnitId::next();
        let b = UnitId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }
}
