//! Per-index thinking accumulation.
//!
//! The agent can interleave several thinking streams, each keyed by a
//! `content_index`. Indices may arrive out of order or with gaps; slots that
//! were never written read as empty.

use std::collections::BTreeMap;

/// Thinking text accumulated per content index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThinkingStreams {
    slots: BTreeMap<usize, String>,
    last_updated: Option<usize>,
}

impl ThinkingStreams {
    /// Create an empty set of streams.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment to slot `index` and return the accumulated text.
    pub fn append(&mut self, index: usize, fragment: &str) -> &str {
        self.last_updated = Some(index);
        let slot = self.slots.entry(index).or_default();
        slot.push_str(fragment);
        slot
    }

    /// Replace the content of slot `index`.
    pub fn replace(&mut self, index: usize, text: impl Into<String>) {
        self.last_updated = Some(index);
        self.slots.insert(index, text.into());
    }

    /// Text of slot `index`; empty for slots never written.
    #[must_use]
    pub fn get(&self, index: usize) -> &str {
        self.slots.get(&index).map_or("", String::as_str)
    }

    /// Number of slots, counting gaps below the highest index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.keys().next_back().map_or(0, |max| max + 1)
    }

    /// Check if no slot was ever written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Non-empty slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.slots
            .iter()
            .filter(|(_, text)| !text.is_empty())
            .map(|(index, text)| (*index, text.as_str()))
    }

    /// The most recently updated slot, if it has content.
    ///
    /// Falls back to the highest non-empty slot when the last write left its
    /// slot empty.
    #[must_use]
    pub fn latest(&self) -> Option<(usize, &str)> {
        self.last_updated
            .map(|index| (index, self.get(index)))
            .filter(|(_, text)| !text.is_empty())
            .or_else(|| self.iter().last())
    }
}
