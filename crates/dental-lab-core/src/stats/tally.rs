//! Insertion-ordered counters.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One bar of a dashboard chart or one line of a report breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyEntry {
    pub name: String,
    pub count: usize,
}

/// Counter keyed by string that remembers first-seen key order.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    entries: Vec<TallyEntry>,
    index: HashMap<String, usize>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to `key`, appending the key if it is new.
    ///
    /// A zero amount still registers the key.
    pub fn add(&mut self, key: &str, amount: usize) {
        match self.index.get(key) {
            Some(&pos) => self.entries[pos].count += amount,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push(TallyEntry {
                    name: key.to_string(),
                    count: amount,
                });
            }
        }
    }

    pub fn increment(&mut self, key: &str) {
        self.add(key, 1);
    }

    pub fn get(&self, key: &str) -> Option<usize> {
        self.index.get(key).map(|&pos| self.entries[pos].count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn entries(&self) -> &[TallyEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<TallyEntry> {
        self.entries
    }
}

/// Look up a count in an ordered entry list.
pub fn count_of(entries: &[TallyEntry], name: &str) -> Option<usize> {
    entries.iter().find(|e| e.name == name).map(|e| e.count)
}
