// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery of one broadcast with sub-destination fallback and bounded retry.
//!
//! A round moves through [`DeliveryState`]:
//!
//! ```text
//! Attempting ──ok──────────────────────────────▶ Delivered
//!     │ send failed
//!     ▼
//! FallbackAttempting ──ok──────────────────────▶ Delivered
//!     │ no text channel / enumeration / send failed
//!     ▼
//! Retrying ──budget left, after delay──▶ Attempting
//!     └──budget spent──────────────────▶ Abandoned
//! ```
//!
//! Every pass through `Attempting` draws a fresh destination. An empty pool
//! ends the round as `Skipped`; cancellation during the retry delay ends it
//! as `Cancelled`.

use std::time::Duration;

use futures::StreamExt;
use murmur_config::model::DeliveryConfig;
use murmur_core::{MurmurError, TransportAdapter};
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::last_sent::LastSentCache;
use crate::selection::{SelectionEngine, SelectionError};

/// Retry settings for one endpoint.
#[derive(Debug, Clone)]
pub struct DeliveryPolicy {
    /// Retries allowed after the first failed attempt.
    pub max_retry: u32,
    pub retry_delay: Duration,
    /// Report retries and abandonment with the full error chain.
    pub debug_mode: bool,
}

impl DeliveryPolicy {
    pub fn from_config(config: &DeliveryConfig) -> Self {
        Self {
            max_retry: config.max_retry,
            retry_delay: config.retry_delay(),
            debug_mode: config.debug_mode,
        }
    }
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self::from_config(&DeliveryConfig::default())
    }
}

/// Why one delivery attempt failed.
#[derive(Debug, Error)]
pub enum DeliveryFailure {
    #[error("sending to `{target}` failed: {source}")]
    Send {
        target: String,
        #[source]
        source: MurmurError,
    },

    #[error("`{destination}` has no text sub-destination to fall back to")]
    NoEligibleFallback { destination: String },

    #[error("listing sub-destinations of `{destination}` failed: {source}")]
    Enumeration {
        destination: String,
        #[source]
        source: MurmurError,
    },

    #[error(transparent)]
    Selection(SelectionError),
}

impl DeliveryFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            DeliveryFailure::Send { .. } => "Send",
            DeliveryFailure::NoEligibleFallback { .. } => "NoEligibleFallback",
            DeliveryFailure::Enumeration { .. } => "Enumeration",
            DeliveryFailure::Selection(_) => "Selection",
        }
    }

    /// One-line `kind: message` form, or the full debug chain.
    pub fn report(&self, debug_mode: bool) -> String {
        if debug_mode {
            format!("{self:?}")
        } else {
            format!("{}: {self}", self.kind())
        }
    }
}

/// Result of one delivery round on one endpoint. Never an error.
#[derive(Debug)]
pub enum DeliveryOutcome {
    Delivered {
        destination: String,
        /// The destination itself, or the sub-destination used as fallback.
        target: String,
        text: String,
        attempts: u32,
    },
    /// The destination drawn had no candidate messages.
    Skipped { destination: String },
    Exhausted {
        attempts: u32,
        last_failure: DeliveryFailure,
    },
    Cancelled,
    /// The endpoint resolved to no destinations at all.
    NoDestinations,
}

impl DeliveryOutcome {
    /// Stable label used for metrics and round summaries.
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered { .. } => "delivered",
            DeliveryOutcome::Skipped { .. } => "skipped",
            DeliveryOutcome::Exhausted { .. } => "exhausted",
            DeliveryOutcome::Cancelled => "cancelled",
            DeliveryOutcome::NoDestinations => "no_destinations",
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

/// States of the delivery machine.
#[derive(Debug)]
pub enum DeliveryState {
    Attempting,
    FallbackAttempting { destination: String, text: String },
    Retrying { failure: DeliveryFailure },
    Abandoned { failure: DeliveryFailure },
    Delivered {
        destination: String,
        target: String,
        text: String,
    },
    Skipped { destination: String },
    Cancelled,
}

/// Counts failed attempts against `max_retry`.
#[derive(Debug, Clone, Copy)]
pub struct RetryBudget {
    max_retry: u32,
    retry: u32,
}

impl RetryBudget {
    pub fn new(max_retry: u32) -> Self {
        Self {
            max_retry,
            retry: 0,
        }
    }

    /// Record a failure. Returns `false` once the budget is spent.
    pub fn consume(&mut self) -> bool {
        self.retry += 1;
        self.retry <= self.max_retry
    }

    pub fn retry(&self) -> u32 {
        self.retry
    }

    pub fn max_retry(&self) -> u32 {
        self.max_retry
    }
}

/// Drives [`DeliveryState`] for one endpoint.
pub struct DeliveryOrchestrator<'a> {
    transport: &'a dyn TransportAdapter,
    selection: &'a SelectionEngine,
    policy: &'a DeliveryPolicy,
}

impl<'a> DeliveryOrchestrator<'a> {
    pub fn new(
        transport: &'a dyn TransportAdapter,
        selection: &'a SelectionEngine,
        policy: &'a DeliveryPolicy,
    ) -> Self {
        Self {
            transport,
            selection,
            policy,
        }
    }

    /// Run one delivery round over `destinations`.
    pub async fn deliver<R: Rng + ?Sized>(
        &self,
        destinations: &[String],
        cache: &mut LastSentCache,
        rng: &mut R,
        cancel: &CancellationToken,
    ) -> DeliveryOutcome {
        let platform = self.transport.platform();
        let mut budget = RetryBudget::new(self.policy.max_retry);
        let mut attempts = 0u32;
        let mut state = DeliveryState::Attempting;

        loop {
            state = match state {
                DeliveryState::Attempting => {
                    let Some(destination) = destinations.choose(rng).cloned() else {
                        return DeliveryOutcome::NoDestinations;
                    };
                    attempts += 1;
                    self.attempt(destination, cache, rng).await
                }
                DeliveryState::FallbackAttempting { destination, text } => {
                    self.fallback(destination, text, rng).await
                }
                DeliveryState::Retrying { failure } => {
                    if !budget.consume() {
                        DeliveryState::Abandoned { failure }
                    } else {
                        warn!(
                            platform,
                            error = %failure.report(self.policy.debug_mode),
                            "broadcast failed, retried {}/{}, next attempt in {:?}",
                            budget.retry() - 1,
                            budget.max_retry(),
                            self.policy.retry_delay,
                        );
                        tokio::select! {
                            _ = cancel.cancelled() => DeliveryState::Cancelled,
                            _ = tokio::time::sleep(self.policy.retry_delay) => DeliveryState::Attempting,
                        }
                    }
                }
                DeliveryState::Delivered {
                    destination,
                    target,
                    text,
                } => {
                    info!(platform, %destination, %target, attempts, "broadcast delivered");
                    return DeliveryOutcome::Delivered {
                        destination,
                        target,
                        text,
                        attempts,
                    };
                }
                DeliveryState::Skipped { destination } => {
                    info!(platform, %destination, "no messages for destination, skipping round");
                    return DeliveryOutcome::Skipped { destination };
                }
                DeliveryState::Abandoned { failure } => {
                    warn!(
                        platform,
                        attempts,
                        "broadcast abandoned after {} retries: {}",
                        budget.max_retry(),
                        failure.report(self.policy.debug_mode),
                    );
                    return DeliveryOutcome::Exhausted {
                        attempts,
                        last_failure: failure,
                    };
                }
                DeliveryState::Cancelled => {
                    debug!(platform, "delivery cancelled during retry delay");
                    return DeliveryOutcome::Cancelled;
                }
            };
        }
    }

    async fn attempt<R: Rng + ?Sized>(
        &self,
        destination: String,
        cache: &mut LastSentCache,
        rng: &mut R,
    ) -> DeliveryState {
        let text = match self.selection.select_message(&destination, cache, rng).await {
            Ok(text) => text,
            Err(SelectionError::EmptyPool { .. }) => return DeliveryState::Skipped { destination },
            Err(e) => {
                return DeliveryState::Retrying {
                    failure: DeliveryFailure::Selection(e),
                };
            }
        };

        match self.transport.send(&destination, &text).await {
            Ok(_) => {
                self.record_send("direct", true);
                DeliveryState::Delivered {
                    target: destination.clone(),
                    destination,
                    text,
                }
            }
            Err(e) => {
                self.record_send("direct", false);
                debug!(
                    platform = self.transport.platform(),
                    %destination,
                    error = %e,
                    "direct send failed, trying a text sub-destination"
                );
                DeliveryState::FallbackAttempting { destination, text }
            }
        }
    }

    async fn fallback<R: Rng + ?Sized>(
        &self,
        destination: String,
        text: String,
        rng: &mut R,
    ) -> DeliveryState {
        let mut stream = match self.transport.sub_destinations(&destination).await {
            Ok(stream) => stream,
            Err(source) => {
                return DeliveryState::Retrying {
                    failure: DeliveryFailure::Enumeration {
                        destination,
                        source,
                    },
                };
            }
        };

        let mut eligible = Vec::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(sub) if sub.is_text() => eligible.push(sub.id),
                Ok(_) => {}
                Err(source) => {
                    return DeliveryState::Retrying {
                        failure: DeliveryFailure::Enumeration {
                            destination,
                            source,
                        },
                    };
                }
            }
        }

        let Some(target) = eligible.choose(rng).cloned() else {
            return DeliveryState::Retrying {
                failure: DeliveryFailure::NoEligibleFallback { destination },
            };
        };

        match self.transport.send(&target, &text).await {
            Ok(_) => {
                self.record_send("fallback", true);
                DeliveryState::Delivered {
                    destination,
                    target,
                    text,
                }
            }
            Err(source) => {
                self.record_send("fallback", false);
                DeliveryState::Retrying {
                    failure: DeliveryFailure::Send { target, source },
                }
            }
        }
    }

    #[cfg_attr(not(feature = "prometheus"), allow(unused_variables))]
    fn record_send(&self, kind: &'static str, ok: bool) {
        #[cfg(feature = "prometheus")]
        murmur_prometheus::record_send_attempt(self.transport.platform(), kind, ok);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use murmur_core::types::SubDestinationKind;
    use murmur_core::{Scope, SubDestination};
    use murmur_test_utils::{MemoryPool, MockTransport};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tracing_test::traced_test;

    fn policy(max_retry: u32) -> DeliveryPolicy {
        DeliveryPolicy {
            max_retry,
            retry_delay: Duration::from_millis(500),
            debug_mode: false,
        }
    }

    async fn engine_with(texts: &[&str]) -> SelectionEngine {
        let pool = Arc::new(MemoryPool::new());
        for text in texts {
            pool.seed(text, Scope::Global).await;
        }
        SelectionEngine::new(pool, Vec::new(), false)
    }

    fn dests(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn retry_budget_allows_max_retry_retries() {
        let mut budget = RetryBudget::new(2);
        assert!(budget.consume());
        assert!(budget.consume());
        assert!(!budget.consume());
        assert_eq!(budget.retry(), 3);
    }

    #[test]
    fn zero_retry_budget_abandons_on_first_failure() {
        let mut budget = RetryBudget::new(0);
        assert!(!budget.consume());
    }

    #[test]
    fn failure_report_compact_and_debug() {
        let failure = DeliveryFailure::NoEligibleFallback {
            destination: "g1".into(),
        };
        assert_eq!(
            failure.report(false),
            "NoEligibleFallback: `g1` has no text sub-destination to fall back to"
        );
        assert!(failure.report(true).starts_with("NoEligibleFallback {"));
    }

    #[tokio::test(start_paused = true)]
    async fn direct_send_success_delivers_on_first_attempt() {
        let transport = MockTransport::new("mock");
        let selection = engine_with(&["hello"]).await;
        let policy = policy(2);
        let orchestrator = DeliveryOrchestrator::new(&transport, &selection, &policy);
        let mut cache = LastSentCache::new();
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = orchestrator
            .deliver(&dests(&["g1"]), &mut cache, &mut rng, &CancellationToken::new())
            .await;

        match outcome {
            DeliveryOutcome::Delivered {
                destination,
                target,
                text,
                attempts,
            } => {
                assert_eq!(destination, "g1");
                assert_eq!(target, "g1");
                assert_eq!(text, "hello");
                assert_eq!(attempts, 1);
            }
            other => panic!("expected Delivered, got {other:?}"),
        }
        let sent = transport.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].target, "g1");
        assert_eq!(sent[0].text, "hello");
    }

    #[tokio::test(start_paused = true)]
    async fn falls_back_to_text_sub_destination() {
        let transport = MockTransport::new("mock")
            .with_failing_target("g1")
            .with_sub_destinations(
                "g1",
                vec![
                    SubDestination {
                        id: "voice".into(),
                        kind: SubDestinationKind::Voice,
                    },
                    SubDestination::text("general"),
                    SubDestination {
                        id: "cat".into(),
                        kind: SubDestinationKind::Category,
                    },
                ],
            );
        let selection = engine_with(&["hello"]).await;
        let policy = policy(2);
        let orchestrator = DeliveryOrchestrator::new(&transport, &selection, &policy);
        let mut cache = LastSentCache::new();
        let mut rng = StdRng::seed_from_u64(9);

        let outcome = orchestrator
            .deliver(&dests(&["g1"]), &mut cache, &mut rng, &CancellationToken::new())
            .await;

        match outcome {
            DeliveryOutcome::Delivered {
                destination,
                target,
                attempts,
                ..
            } => {
                assert_eq!(destination, "g1");
                assert_eq!(target, "general");
                assert_eq!(attempts, 1);
            }
            other => panic!("expected Delivered, got {other:?}"),
        }
        assert_eq!(transport.send_attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn exhausts_after_max_retry_plus_one_attempts() {
        let transport = MockTransport::new("mock");
        transport.fail_all_sends(true);
        let selection = engine_with(&["hello"]).await;
        let policy = policy(2);
        let orchestrator = DeliveryOrchestrator::new(&transport, &selection, &policy);
        let mut cache = LastSentCache::new();
        let mut rng = StdRng::seed_from_u64(5);

        let outcome = orchestrator
            .deliver(&dests(&["g1", "g2"]), &mut cache, &mut rng, &CancellationToken::new())
            .await;

        match outcome {
            DeliveryOutcome::Exhausted {
                attempts,
                last_failure,
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_failure.kind(), "NoEligibleFallback");
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
        // No sub-destinations configured, so only direct sends were tried.
        assert_eq!(transport.send_attempts(), 3);

        logs_assert(|lines: &[&str]| {
            let abandoned = lines
                .iter()
                .filter(|line| line.contains("broadcast abandoned"))
                .count();
            let retried = lines
                .iter()
                .filter(|line| line.contains("broadcast failed, retried"))
                .count();
            match (abandoned, retried) {
                (1, 2) => Ok(()),
                other => Err(format!("unexpected (abandoned, retried) counts: {other:?}")),
            }
        });
    }

    async fn exhaust(
        transport: &MockTransport,
        selection: &SelectionEngine,
        max_retry: u32,
    ) -> (u32, DeliveryFailure) {
        let policy = policy(max_retry);
        let orchestrator = DeliveryOrchestrator::new(transport, selection, &policy);
        let mut cache = LastSentCache::new();
        let mut rng = StdRng::seed_from_u64(11);

        match orchestrator
            .deliver(&dests(&["g1"]), &mut cache, &mut rng, &CancellationToken::new())
            .await
        {
            DeliveryOutcome::Exhausted {
                attempts,
                last_failure,
            } => (attempts, last_failure),
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fallback_send_counts_against_the_budget() {
        let transport = MockTransport::new("mock")
            .with_sub_destinations("g1", vec![SubDestination::text("general")]);
        transport.fail_all_sends(true);
        let selection = engine_with(&["hello"]).await;

        let (attempts, failure) = exhaust(&transport, &selection, 2).await;

        assert_eq!(attempts, 3);
        assert_eq!(failure.kind(), "Send");
        assert!(matches!(failure, DeliveryFailure::Send { ref target, .. } if target == "general"));
        // One direct and one fallback send per attempt.
        assert_eq!(transport.send_attempts(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn sub_destination_listing_failure_counts_against_the_budget() {
        let transport = MockTransport::new("mock")
            .with_sub_destinations("g1", vec![SubDestination::text("general")]);
        transport.fail_all_sends(true);
        transport.fail_sub_enumeration(true);
        let selection = engine_with(&["hello"]).await;

        let (attempts, failure) = exhaust(&transport, &selection, 2).await;

        assert_eq!(attempts, 3);
        assert_eq!(failure.kind(), "Enumeration");
        assert_eq!(transport.send_attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn repository_failure_counts_against_the_budget() {
        let pool = Arc::new(MemoryPool::new());
        pool.seed("hello", Scope::Global).await;
        pool.fail_reads(true);
        let selection = SelectionEngine::new(pool, Vec::new(), false);
        let transport = MockTransport::new("mock");

        let (attempts, failure) = exhaust(&transport, &selection, 2).await;

        assert_eq!(attempts, 3);
        assert_eq!(failure.kind(), "Selection");
        assert_eq!(transport.send_attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn debug_mode_reports_retries_with_full_chain() {
        let transport = MockTransport::new("mock");
        transport.fail_all_sends(true);
        let selection = engine_with(&["hello"]).await;
        let policy = DeliveryPolicy {
            debug_mode: true,
            ..policy(1)
        };
        let orchestrator = DeliveryOrchestrator::new(&transport, &selection, &policy);
        let mut cache = LastSentCache::new();
        let mut rng = StdRng::seed_from_u64(3);

        orchestrator
            .deliver(&dests(&["g1"]), &mut cache, &mut rng, &CancellationToken::new())
            .await;

        logs_assert(|lines: &[&str]| {
            let retried: Vec<_> = lines
                .iter()
                .filter(|line| line.contains("broadcast failed, retried"))
                .collect();
            match retried.as_slice() {
                [line] if line.contains("NoEligibleFallback {") => Ok(()),
                other => Err(format!("expected one debug-form retry warning, got {other:?}")),
            }
        });
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_when_a_later_attempt_succeeds() {
        let transport = MockTransport::new("mock");
        transport.fail_next_sends(1);
        let selection = engine_with(&["hello"]).await;
        let policy = policy(3);
        let orchestrator = DeliveryOrchestrator::new(&transport, &selection, &policy);
        let mut cache = LastSentCache::new();
        let mut rng = StdRng::seed_from_u64(5);

        let outcome = orchestrator
            .deliver(&dests(&["g1"]), &mut cache, &mut rng, &CancellationToken::new())
            .await;

        match outcome {
            DeliveryOutcome::Delivered { attempts, .. } => assert_eq!(attempts, 2),
            other => panic!("expected Delivered, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn empty_pool_skips_without_sending() {
        let transport = MockTransport::new("mock");
        let selection = engine_with(&[]).await;
        let policy = policy(2);
        let orchestrator = DeliveryOrchestrator::new(&transport, &selection, &policy);
        let mut cache = LastSentCache::new();
        let mut rng = StdRng::seed_from_u64(5);

        let outcome = orchestrator
            .deliver(&dests(&["g1"]), &mut cache, &mut rng, &CancellationToken::new())
            .await;

        assert!(matches!(outcome, DeliveryOutcome::Skipped { ref destination } if destination == "g1"));
        assert_eq!(transport.send_attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn last_sent_is_recorded_even_when_delivery_fails() {
        let transport = MockTransport::new("mock");
        transport.fail_all_sends(true);
        let selection = engine_with(&["hello"]).await;
        let policy = policy(0);
        let orchestrator = DeliveryOrchestrator::new(&transport, &selection, &policy);
        let mut cache = LastSentCache::new();
        let mut rng = StdRng::seed_from_u64(5);

        let outcome = orchestrator
            .deliver(&dests(&["g1"]), &mut cache, &mut rng, &CancellationToken::new())
            .await;

        assert!(matches!(outcome, DeliveryOutcome::Exhausted { attempts: 1, .. }));
        assert_eq!(cache.get("g1"), Some("hello"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_retry_delay_returns_cancelled() {
        let transport = MockTransport::new("mock");
        transport.fail_all_sends(true);
        let selection = engine_with(&["hello"]).await;
        let policy = policy(5);
        let orchestrator = DeliveryOrchestrator::new(&transport, &selection, &policy);
        let mut cache = LastSentCache::new();
        let mut rng = StdRng::seed_from_u64(5);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = orchestrator
            .deliver(&dests(&["g1"]), &mut cache, &mut rng, &cancel)
            .await;

        assert!(matches!(outcome, DeliveryOutcome::Cancelled));
        assert_eq!(transport.send_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn no_destinations_is_reported() {
        let transport = MockTransport::new("mock");
        let selection = engine_with(&["hello"]).await;
        let policy = policy(2);
        let orchestrator = DeliveryOrchestrator::new(&transport, &selection, &policy);
        let mut cache = LastSentCache::new();
        let mut rng = StdRng::seed_from_u64(5);

        let outcome = orchestrator
            .deliver(&[], &mut cache, &mut rng, &CancellationToken::new())
            .await;
        assert_eq!(outcome.label(), "no_destinations");
    }
}
