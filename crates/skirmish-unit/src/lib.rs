//! Feature units for the Skirmish arena framework.
//!
//! A [`FeatureUnit`] is a lifecycle node that owns a set of
//! [`Feature`]s and refers to zero or more parent units. Units form a
//! DAG: parents supply shared capabilities, children look them up by
//! type without owning them.
//!
//! # Lifecycle
//!
//! ```text
//! init       parents first, then own features, then on_init
//! post_init  parents first, then features' post_init, then on_post_init
//! clear      on_clear first, then features (reverse order), then parents
//! ```
//!
//! `post_init` exists so that a feature can look up siblings and
//! ancestors that did not exist yet while it was being initialized.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod feature;
pub mod unit;

pub use config::UnitConfig;
pub use feature::{Blueprint, Feature, FeatureList};
pub use unit::FeatureUnit;
