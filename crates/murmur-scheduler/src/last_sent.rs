// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-destination memory of the most recently selected message.

use std::collections::HashMap;

/// Maps a destination id to the text last selected for it.
///
/// Owned by the [`Scheduler`](crate::Scheduler) and lent to selection for
/// each attempt. The entry is written when a message is chosen, before the
/// send is attempted, so a failed send still counts as "last sent" for the
/// no-repeat rule. Contents are lost on restart.
#[derive(Debug, Default, Clone)]
pub struct LastSentCache {
    entries: HashMap<String, String>,
}

impl LastSentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text last selected for `destination`, if any.
    pub fn get(&self, destination: &str) -> Option<&str> {
        self.entries.get(destination).map(String::as_str)
    }

    /// Record `text` as the latest selection for `destination`.
    pub fn record(&mut self, destination: &str, text: &str) {
        match self.entries.get_mut(destination) {
            Some(existing) => {
                existing.clear();
                existing.push_str(text);
            }
            None => {
                self.entries
                    .insert(destination.to_string(), text.to_string());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let cache = LastSentCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.get("g1"), None);
    }

    #[test]
    fn record_overwrites_per_destination() {
        let mut cache = LastSentCache::new();
        cache.record("g1", "hello");
        cache.record("g2", "bye");
        cache.record("g1", "again");

        assert_eq!(cache.get("g1"), Some("again"));
        assert_eq!(cache.get("g2"), Some("bye"));
        assert_eq!(cache.len(), 2);
    }
}
