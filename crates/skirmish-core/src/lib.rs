//! Core types for the Skirmish arena framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the abstractions shared by the unit and arena crates: type keys,
//! unit identifiers, the lifecycle marker, the type-keyed registry,
//! and the error taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod lifecycle;
pub mod registry;

pub use error::{ConfigError, HookError, LifecycleError, Phase};
pub use id::{Erased, StateKey, TypeKey, UnitId};
pub use lifecycle::{Lifecycle, LifecycleCell};
pub use registry::{DuplicateKey, TypeRegistry};
