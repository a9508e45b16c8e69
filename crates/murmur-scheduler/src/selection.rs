// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message selection: candidate pool assembly and the no-repeat draw.

use std::collections::HashSet;
use std::sync::Arc;

use murmur_config::model::{DeliveryConfig, PoolConfig};
use murmur_core::types::{MessageRecord, PoolFilter};
use murmur_core::{MurmurError, PoolRepository};
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::last_sent::LastSentCache;

/// Why no message could be chosen for a destination.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// Neither the configured list nor the store has anything for this destination.
    #[error("no messages available for destination `{destination}`")]
    EmptyPool { destination: String },

    /// The pool repository could not be read.
    #[error("failed to read message pool: {0}")]
    Repository(#[source] MurmurError),
}

impl SelectionError {
    pub fn kind(&self) -> &'static str {
        match self {
            SelectionError::EmptyPool { .. } => "EmptyPool",
            SelectionError::Repository(_) => "Repository",
        }
    }
}

/// Merge the configured global list with stored records.
///
/// Texts are deduplicated keeping the first occurrence, configured entries
/// first, so a seeded RNG always sees the same ordering.
pub fn candidate_pool(global_messages: &[String], records: &[MessageRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    global_messages
        .iter()
        .map(String::as_str)
        .chain(records.iter().map(|r| r.text.as_str()))
        .filter(|text| seen.insert(*text))
        .map(str::to_string)
        .collect()
}

/// Draw one text from `pool`.
///
/// With `no_repeat` set and at least two candidates, `last` is excluded
/// from the draw. Returns `None` only for an empty pool.
pub fn draw<'a, R: Rng + ?Sized>(
    pool: &'a [String],
    last: Option<&str>,
    no_repeat: bool,
    rng: &mut R,
) -> Option<&'a String> {
    if no_repeat
        && pool.len() > 1
        && let Some(last) = last
    {
        let fresh: Vec<&String> = pool.iter().filter(|text| text.as_str() != last).collect();
        if !fresh.is_empty() {
            return fresh.choose(rng).copied();
        }
    }
    pool.choose(rng)
}

/// Chooses the text to broadcast to a destination.
#[derive(Clone)]
pub struct SelectionEngine {
    pool: Arc<dyn PoolRepository>,
    global_messages: Vec<String>,
    no_repeat: bool,
}

impl SelectionEngine {
    pub fn new(pool: Arc<dyn PoolRepository>, global_messages: Vec<String>, no_repeat: bool) -> Self {
        Self {
            pool,
            global_messages,
            no_repeat,
        }
    }

    /// Build from the `[pool]` and `[delivery]` config sections.
    pub fn from_config(
        pool: Arc<dyn PoolRepository>,
        pool_config: &PoolConfig,
        delivery: &DeliveryConfig,
    ) -> Self {
        Self::new(pool, pool_config.global_messages.clone(), delivery.no_repeat)
    }

    /// The deduplicated candidate pool for `destination`.
    pub async fn candidates(&self, destination: &str) -> Result<Vec<String>, SelectionError> {
        let records = self
            .pool
            .find(&PoolFilter::ForDestination(destination.to_string()))
            .await
            .map_err(SelectionError::Repository)?;
        Ok(candidate_pool(&self.global_messages, &records))
    }

    /// Pick a message for `destination` and remember it in `cache`.
    pub async fn select_message<R: Rng + ?Sized>(
        &self,
        destination: &str,
        cache: &mut LastSentCache,
        rng: &mut R,
    ) -> Result<String, SelectionError> {
        let pool = self.candidates(destination).await?;

        #[cfg(feature = "prometheus")]
        murmur_prometheus::set_pool_size(pool.len() as f64);

        let text = draw(&pool, cache.get(destination), self.no_repeat, rng)
            .cloned()
            .ok_or_else(|| SelectionError::EmptyPool {
                destination: destination.to_string(),
            })?;

        debug!(destination, candidates = pool.len(), "message selected");
        cache.record(destination, &text);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_core::Scope;
    use murmur_test_utils::MemoryPool;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(id: i64, text: &str, scope: Scope) -> MessageRecord {
        MessageRecord {
            id,
            text: text.to_string(),
            scope,
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn candidate_pool_dedups_keeping_first_seen_order() {
        let records = vec![
            record(1, "a", Scope::Global),
            record(2, "a", Scope::Destination("g1".into())),
            record(3, "b", Scope::Global),
        ];
        let pool = candidate_pool(&strings(&["b"]), &records);
        assert_eq!(pool, strings(&["b", "a"]));
    }

    #[test]
    fn single_candidate_is_repeated_even_with_no_repeat() {
        let pool = strings(&["only"]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            let picked = draw(&pool, Some("only"), true, &mut rng);
            assert_eq!(picked.map(String::as_str), Some("only"));
        }
    }

    #[test]
    fn no_repeat_never_draws_last_text() {
        let pool = strings(&["a", "b", "c"]);
        let mut rng = StdRng::seed_from_u64(42);
        let mut last: Option<String> = None;
        for _ in 0..500 {
            let picked = draw(&pool, last.as_deref(), true, &mut rng)
                .cloned()
                .unwrap();
            assert_ne!(Some(&picked), last.as_ref());
            last = Some(picked);
        }
    }

    #[test]
    fn repeats_are_possible_without_no_repeat() {
        let pool = strings(&["a", "b"]);
        let mut rng = StdRng::seed_from_u64(1);
        let mut last = draw(&pool, None, false, &mut rng).cloned();
        let mut repeated = false;
        for _ in 0..200 {
            let picked = draw(&pool, last.as_deref(), false, &mut rng).cloned();
            repeated |= picked == last;
            last = picked;
        }
        assert!(repeated);
    }

    #[test]
    fn empty_pool_draws_nothing() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(draw(&[], Some("x"), true, &mut rng).is_none());
    }

    #[tokio::test]
    async fn selects_single_stored_record_and_caches_it() {
        let pool = Arc::new(MemoryPool::new());
        pool.seed("hello", Scope::Global).await;
        let engine = SelectionEngine::new(pool, Vec::new(), false);
        let mut cache = LastSentCache::new();
        let mut rng = StdRng::seed_from_u64(0);

        let text = engine
            .select_message("g1", &mut cache, &mut rng)
            .await
            .unwrap();
        assert_eq!(text, "hello");
        assert_eq!(cache.get("g1"), Some("hello"));
    }

    #[tokio::test]
    async fn other_destinations_records_are_not_candidates() {
        let pool = Arc::new(MemoryPool::new());
        pool.seed("for g2", Scope::Destination("g2".into())).await;
        pool.seed("for g1", Scope::Destination("g1".into())).await;
        let engine = SelectionEngine::new(pool, strings(&["from config"]), false);

        let candidates = engine.candidates("g1").await.unwrap();
        assert_eq!(candidates, strings(&["from config", "for g1"]));
    }

    #[tokio::test]
    async fn empty_pool_is_reported_and_cache_untouched() {
        let engine = SelectionEngine::new(Arc::new(MemoryPool::new()), Vec::new(), true);
        let mut cache = LastSentCache::new();
        let mut rng = StdRng::seed_from_u64(0);

        let err = engine
            .select_message("g1", &mut cache, &mut rng)
            .await
            .unwrap_err();
        assert!(matches!(err, SelectionError::EmptyPool { ref destination } if destination == "g1"));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn repository_failure_surfaces_as_repository_error() {
        let pool = Arc::new(MemoryPool::new());
        pool.fail_reads(true);
        let engine = SelectionEngine::new(pool, strings(&["a"]), false);
        let mut cache = LastSentCache::new();
        let mut rng = StdRng::seed_from_u64(0);

        let err = engine
            .select_message("g1", &mut cache, &mut rng)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "Repository");
    }
}
