//! harvest::seen
//!
//! Per-project deduplication by issue key.

use std::collections::HashSet;

use crate::core::types::Issue;

/// Issue keys already collected for the current project.
///
/// Created fresh for each project and dropped with it.
#[derive(Debug, Default)]
pub struct SeenSet {
    keys: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key. Returns `true` if it was not seen before.
    pub fn insert(&mut self, key: &str) -> bool {
        if self.keys.contains(key) {
            return false;
        }
        self.keys.insert(key.to_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Append every issue whose key is new to `into`; returns how many were added.
    pub fn merge(&mut self, issues: impl IntoIterator<Item = Issue>, into: &mut Vec<Issue>) -> usize {
        let before = into.len();
        for issue in issues {
            if self.insert(&issue.key) {
                into.push(issue);
            }
        }
        into.len() - before
    }
}
