//! Test utilities and recording fixtures for Skirmish development.
//!
//! Every fixture writes what happens to it into a shared [`CallLog`], so
//! a test can assert the exact order in which lifecycle and tick hooks
//! ran across a whole unit tree.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

pub mod fixtures;

/// Shared, ordered record of hook calls.
///
/// Cloning yields a handle to the same log.
#[derive(Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Copy of all entries so far.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Remove and return all entries.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.entries.lock())
    }

    /// Index of the first entry equal to `entry`.
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries.lock().iter().position(|e| e == entry)
    }

    /// Number of entries equal to `entry`.
    pub fn count(&self, entry: &str) -> usize {
        self.entries.lock().iter().filter(|e| *e == entry).count()
    }

    /// Whether `first` was recorded before `second`. Both must be present.
    pub fn before(&self, first: &str, second: &str) -> bool {
        match (self.position(first), self.position(second)) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        }
    }
}

impl fmt::Debug for CallLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.lock().iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_entries() {
        let log = CallLog::new();
        let other = log.clone();
        log.record("a");
        other.record("b");
        assert_eq!(log.entries(), vec!["a", "b"]);
        assert!(log.before("a", "b"));
        assert!(!log.before("b", "a"));
        assert!(!log.before("a", "missing"));
        assert_eq!(other.take(), vec!["a", "b"]);
        assert!(log.entries().is_empty());
    }
}
