// File: rusty-constraints-core/src/key.rs
// Purpose: Hierarchical feedback identifiers and the registry handing them out

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use crate::error::ConfigError;
use crate::lock;

/// Identifier of a rule group or a rule: the path of indices from the form
/// root, displayed as `0.1.2`
///
/// A rule `0.3` belongs to group `0`; rule `0.2.1` belongs to group `0.2`,
/// itself nested in `0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedbackKey(Vec<usize>);

impl FeedbackKey {
    pub fn root(index: usize) -> Self {
        Self(vec![index])
    }

    pub fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        Self(path)
    }

    pub fn path(&self) -> &[usize] {
        &self.0
    }

    /// True for keys strictly below `group`
    pub fn is_descendant_of(&self, group: &FeedbackKey) -> bool {
        self.0.len() > group.0.len() && self.0.starts_with(&group.0)
    }
}

impl fmt::Display for FeedbackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", index)?;
        }
        Ok(())
    }
}

impl FromStr for FeedbackKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s
            .split('.')
            .map(str::parse::<usize>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ConfigError::InvalidKey {
                value: s.to_string(),
            })?;
        Ok(Self(path))
    }
}

impl Serialize for FeedbackKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FeedbackKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// Form-owned source of keys
///
/// Indices are monotonically increasing per parent and never reused, so a
/// rule mounted again later (an async result rendered for a newer value)
/// cannot collide with an outcome recorded by an earlier one.
#[derive(Debug, Default)]
pub struct KeyRegistry {
    counters: Mutex<HashMap<Option<FeedbackKey>, usize>>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key for a new top-level group
    pub fn next_root(&self) -> FeedbackKey {
        FeedbackKey::root(self.next_index(None))
    }

    /// Key for a new child (rule or nested group) of `parent`
    pub fn next_child(&self, parent: &FeedbackKey) -> FeedbackKey {
        parent.child(self.next_index(Some(parent)))
    }

    fn next_index(&self, parent: Option<&FeedbackKey>) -> usize {
        let mut counters = lock(&self.counters);
        let counter = counters.entry(parent.cloned()).or_insert(0);
        let index = *counter;
        *counter += 1;
        index
    }
}
