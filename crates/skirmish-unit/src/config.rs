//! Unit configuration and validation.
//!
//! [`UnitConfig`] is the construction input for a [`FeatureUnit`] (and
//! for an arena). [`validate()`](UnitConfig::validate) checks structural
//! invariants before the unit exists.

use std::fmt;
use std::sync::Arc;

use skirmish_core::ConfigError;

use crate::unit::FeatureUnit;

/// Name and parent list for a new unit.
///
/// Parents are shared handles; the same parent may appear in many
/// configurations (diamond sharing), but only once per configuration.
#[derive(Clone, Default)]
pub struct UnitConfig {
    /// Diagnostic name. Need not be unique.
    pub name: String,
    /// Parents in lookup order.
    pub parents: Vec<Arc<FeatureUnit>>,
}

impl UnitConfig {
    /// A root configuration (no parents).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
        }
    }

    /// Append a parent.
    pub fn parent(mut self, parent: Arc<FeatureUnit>) -> Self {
        self.parents.push(parent);
        self
    }

    /// Append several parents, in order.
    pub fn parents(mut self, parents: impl IntoIterator<Item = Arc<FeatureUnit>>) -> Self {
        self.parents.extend(parents);
        self
    }

    /// Check structural invariants.
    ///
    /// 1. The name is not blank.
    /// 2. No parent instance is listed twice.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        for (i, parent) in self.parents.iter().enumerate() {
            if self.parents[..i].iter().any(|p| Arc::ptr_eq(p, parent)) {
                return Err(ConfigError::DuplicateParent {
                    unit: self.name.clone(),
                    parent: parent.name().to_string(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for UnitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitConfig")
            .field("name", &self.name)
            .field(
                "parents",
                &self.parents.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureList;

    fn root(name: &str) -> Arc<FeatureUnit> {
        Arc::new(FeatureUnit::new(UnitConfig::new(name), FeatureList::new()).unwrap())
    }

    #[test]
    fn blank_name_rejected() {
        assert_eq!(UnitConfig::new("  ").validate(), Err(ConfigError::EmptyName));
        assert_eq!(UnitConfig::default().validate(), Err(ConfigError::EmptyName));
    }

    #[test]
    fn distinct_parents_with_same_name_accepted() {
        let cfg = UnitConfig::new("child").parent(root("p")).parent(root("p"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn repeated_parent_rejected() {
        let shared = root("shared");
        let cfg = UnitConfig::new("child").parents([Arc::clone(&shared), shared]);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::DuplicateParent {
                unit: "child".into(),
                parent: "shared".into(),
            })
        );
    }

    #[test]
    fn debug_lists_parent_names() {
        let cfg = UnitConfig::new("child").parent(root("base"));
        let s = format!("{cfg:?}");
        assert!(s.contains("child"));
        assert!(s.contains("base"));
    }
}
