// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The broadcast loop: wait a jittered interval, then broadcast once per
//! transport endpoint.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use murmur_config::model::{MurmurConfig, ScheduleConfig};
use murmur_core::{HealthStatus, MurmurError, PoolRepository, TransportAdapter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::countdown::{wait_interval, Countdown, WaitOutcome};
use crate::delivery::{DeliveryOrchestrator, DeliveryOutcome, DeliveryPolicy};
use crate::last_sent::LastSentCache;
use crate::scope::{resolve_destinations, DestinationScope};
use crate::selection::SelectionEngine;

/// Coarse scheduler status, published on a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Constructed, or between a finished round and the next wait.
    Idle,
    Waiting,
    Broadcasting,
    Stopped,
}

/// What happened on one endpoint during a round.
#[derive(Debug)]
pub enum EndpointResult {
    /// Scope resolved to no destinations.
    Skipped,
    /// Dynamic enumeration failed; nothing was sent.
    EnumerationFailed(MurmurError),
    Delivery(DeliveryOutcome),
}

impl EndpointResult {
    pub fn label(&self) -> &'static str {
        match self {
            EndpointResult::Skipped => "skipped",
            EndpointResult::EnumerationFailed(_) => "enumeration_failed",
            EndpointResult::Delivery(outcome) => outcome.label(),
        }
    }
}

#[derive(Debug)]
pub struct EndpointReport {
    pub platform: String,
    pub result: EndpointResult,
}

/// Owns every piece of per-process broadcast state.
pub struct Scheduler {
    transports: Vec<Arc<dyn TransportAdapter>>,
    selection: SelectionEngine,
    policy: DeliveryPolicy,
    schedule: ScheduleConfig,
    scopes: HashMap<String, String>,
    last_sent: LastSentCache,
    rng: StdRng,
    countdown: Countdown,
    state_tx: watch::Sender<SchedulerState>,
}

impl Scheduler {
    /// Build a scheduler for the given endpoints, broadcast in the order given.
    pub fn new(
        config: &MurmurConfig,
        pool: Arc<dyn PoolRepository>,
        transports: Vec<Arc<dyn TransportAdapter>>,
    ) -> Self {
        let (state_tx, _rx) = watch::channel(SchedulerState::Idle);
        Self {
            transports,
            selection: SelectionEngine::from_config(pool, &config.pool, &config.delivery),
            policy: DeliveryPolicy::from_config(&config.delivery),
            schedule: config.schedule.clone(),
            scopes: config.destinations.clone(),
            last_sent: LastSentCache::new(),
            rng: StdRng::from_entropy(),
            countdown: Countdown::new(),
            state_tx,
        }
    }

    /// Replace the random source, e.g. with a seeded one.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SchedulerState> {
        self.state_tx.subscribe()
    }

    /// Seconds until the next broadcast, `None` outside a wait or with the
    /// countdown disabled.
    pub fn subscribe_countdown(&self) -> watch::Receiver<Option<u64>> {
        self.countdown.subscribe()
    }

    pub fn last_sent(&self) -> &LastSentCache {
        &self.last_sent
    }

    /// Aggregate health of the registered endpoints.
    ///
    /// Any endpoint that is not healthy degrades the scheduler as a whole;
    /// the reasons are joined with `; `.
    pub async fn health_check(&self) -> Result<HealthStatus, MurmurError> {
        let mut reasons = Vec::new();
        for transport in &self.transports {
            match transport.health_check().await? {
                HealthStatus::Healthy => {}
                HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason) => {
                    reasons.push(format!("{}: {reason}", transport.platform()));
                }
            }
        }

        if reasons.is_empty() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded(reasons.join("; ")))
        }
    }

    /// Uniform draw from `[min_interval_secs, max_interval_secs]`.
    pub fn next_interval(&mut self) -> Duration {
        let (min, max) = (
            self.schedule.min_interval_secs,
            self.schedule.max_interval_secs,
        );
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        Duration::from_secs(self.rng.gen_range(lo..=hi))
    }

    /// Wait and broadcast until `cancel` fires. Returns the number of
    /// completed rounds.
    pub async fn run(&mut self, cancel: &CancellationToken) -> u64 {
        info!(
            endpoints = self.transports.len(),
            min_interval_secs = self.schedule.min_interval_secs,
            max_interval_secs = self.schedule.max_interval_secs,
            "scheduler started"
        );

        let mut rounds = 0u64;
        loop {
            let interval = self.next_interval();
            self.state_tx.send_replace(SchedulerState::Waiting);
            debug!(secs = interval.as_secs(), "waiting for next broadcast");

            let countdown = self.schedule.countdown.then_some(&self.countdown);
            if wait_interval(interval, cancel, countdown).await == WaitOutcome::Cancelled {
                break;
            }

            self.run_once(cancel).await;
            rounds += 1;
            if cancel.is_cancelled() {
                break;
            }
        }

        self.state_tx.send_replace(SchedulerState::Stopped);
        info!(rounds, "scheduler stopped");
        rounds
    }

    /// Broadcast once on every endpoint, in registration order.
    pub async fn run_once(&mut self, cancel: &CancellationToken) -> Vec<EndpointReport> {
        self.state_tx.send_replace(SchedulerState::Broadcasting);
        let mut reports = Vec::with_capacity(self.transports.len());

        for transport in &self.transports {
            let platform = transport.platform().to_string();
            let scope = DestinationScope::for_platform(&self.scopes, &platform);

            let result = match resolve_destinations(
                transport.as_ref(),
                &scope,
                self.schedule.max_destinations,
            )
            .await
            {
                Err(e) => {
                    warn!(%platform, error = %e, "could not enumerate destinations, skipping endpoint");
                    EndpointResult::EnumerationFailed(e)
                }
                Ok(destinations) if destinations.is_empty() => {
                    debug!(%platform, ?scope, "no destinations in scope, skipping endpoint");
                    EndpointResult::Skipped
                }
                Ok(destinations) => {
                    let orchestrator =
                        DeliveryOrchestrator::new(transport.as_ref(), &self.selection, &self.policy);
                    let outcome = orchestrator
                        .deliver(&destinations, &mut self.last_sent, &mut self.rng, cancel)
                        .await;
                    EndpointResult::Delivery(outcome)
                }
            };

            #[cfg(feature = "prometheus")]
            murmur_prometheus::record_broadcast(&platform, result.label());

            let cancelled = matches!(result, EndpointResult::Delivery(DeliveryOutcome::Cancelled));
            reports.push(EndpointReport { platform, result });
            if cancelled {
                break;
            }
        }

        let delivered = reports
            .iter()
            .filter(|r| matches!(&r.result, EndpointResult::Delivery(o) if o.is_delivered()))
            .count();
        info!(endpoints = reports.len(), delivered, "broadcast round finished");

        self.state_tx.send_replace(SchedulerState::Idle);
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_test_utils::{MemoryPool, MockTransport};

    fn config(min: u64, max: u64) -> MurmurConfig {
        let mut config = MurmurConfig::default();
        config.schedule.min_interval_secs = min;
        config.schedule.max_interval_secs = max;
        config
    }

    fn scheduler(config: &MurmurConfig) -> Scheduler {
        let transport: Arc<dyn TransportAdapter> = Arc::new(MockTransport::new("mock"));
        Scheduler::new(config, Arc::new(MemoryPool::new()), vec![transport])
            .with_rng(StdRng::seed_from_u64(11))
    }

    #[test]
    fn interval_stays_within_bounds() {
        let mut scheduler = scheduler(&config(3, 7));
        for _ in 0..200 {
            let secs = scheduler.next_interval().as_secs();
            assert!((3..=7).contains(&secs));
        }
    }

    #[test]
    fn degenerate_interval_is_fixed() {
        let mut scheduler = scheduler(&config(42, 42));
        assert_eq!(scheduler.next_interval(), Duration::from_secs(42));
    }

    #[tokio::test]
    async fn health_degrades_when_an_endpoint_is_unhealthy() {
        let healthy = Arc::new(MockTransport::new("alpha"));
        let failing = Arc::new(MockTransport::new("beta"));
        let transports = vec![
            healthy as Arc<dyn TransportAdapter>,
            failing.clone() as Arc<dyn TransportAdapter>,
        ];
        let scheduler = Scheduler::new(&config(1, 1), Arc::new(MemoryPool::new()), transports);
        assert_eq!(scheduler.health_check().await.unwrap(), HealthStatus::Healthy);

        failing.fail_enumeration(true);
        match scheduler.health_check().await.unwrap() {
            HealthStatus::Degraded(reason) => {
                assert!(reason.starts_with("beta: "), "got {reason}");
                assert!(!reason.contains("alpha"));
            }
            other => panic!("expected Degraded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn state_starts_idle_and_returns_to_idle_after_round() {
        let mut scheduler = scheduler(&config(1, 1));
        let state = scheduler.subscribe_state();
        assert_eq!(*state.borrow(), SchedulerState::Idle);

        scheduler.run_once(&CancellationToken::new()).await;
        assert_eq!(*state.borrow(), SchedulerState::Idle);
    }
}
