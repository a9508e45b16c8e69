// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transport adapter for deterministic testing.
//!
//! `MockTransport` implements `TransportAdapter` with a fixed destination
//! list, per-destination sub-destinations, scriptable send failures and
//! captured sends for assertion in tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use tokio::sync::Mutex;

use murmur_core::traits::adapter::PluginAdapter;
use murmur_core::traits::transport::{DestinationStream, SubDestinationStream, TransportAdapter};
use murmur_core::types::{
    AdapterType, Destination, HealthStatus, SentMessageId, SubDestination,
};
use murmur_core::MurmurError;

/// A message accepted by [`MockTransport::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub target: String,
    pub text: String,
}

/// A mock transport endpoint for testing.
///
/// - **destinations**: returned by `destinations()` in insertion order
/// - **sub-destinations**: returned by `sub_destinations()` per destination,
///   empty when not configured
/// - **sent**: successful sends, retrievable via `sent_messages()`
pub struct MockTransport {
    platform: String,
    destinations: Vec<Destination>,
    sub_destinations: HashMap<String, Vec<SubDestination>>,
    failing_targets: HashSet<String>,
    fail_all: AtomicBool,
    fail_next: AtomicUsize,
    fail_enumeration: AtomicBool,
    fail_sub_enumeration: AtomicBool,
    attempts: AtomicUsize,
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

impl MockTransport {
    /// Create a transport for `platform` with no destinations.
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            destinations: Vec::new(),
            sub_destinations: HashMap::new(),
            failing_targets: HashSet::new(),
            fail_all: AtomicBool::new(false),
            fail_next: AtomicUsize::new(0),
            fail_enumeration: AtomicBool::new(false),
            fail_sub_enumeration: AtomicBool::new(false),
            attempts: AtomicUsize::new(0),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Destinations reported by dynamic enumeration.
    pub fn with_destinations(mut self, ids: &[&str]) -> Self {
        self.destinations = ids.iter().map(|id| Destination::new(*id)).collect();
        self
    }

    pub fn with_sub_destinations(
        mut self,
        destination: &str,
        subs: Vec<SubDestination>,
    ) -> Self {
        self.sub_destinations.insert(destination.to_string(), subs);
        self
    }

    /// Every send to `target` fails.
    pub fn with_failing_target(mut self, target: &str) -> Self {
        self.failing_targets.insert(target.to_string());
        self
    }

    /// Make every send fail until switched off.
    pub fn fail_all_sends(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Make the next `n` sends fail, whatever their target.
    pub fn fail_next_sends(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Make `destinations()` fail.
    pub fn fail_enumeration(&self, fail: bool) {
        self.fail_enumeration.store(fail, Ordering::SeqCst);
    }

    /// Make `sub_destinations()` fail for every destination.
    pub fn fail_sub_enumeration(&self, fail: bool) {
        self.fail_sub_enumeration.store(fail, Ordering::SeqCst);
    }

    /// Number of `send()` calls, failed ones included.
    pub fn send_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Messages that were sent successfully.
    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    fn should_fail(&self, target: &str) -> bool {
        if self.fail_all.load(Ordering::SeqCst) || self.failing_targets.contains(target) {
            return true;
        }
        self.fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, MurmurError> {
        if self.fail_enumeration.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy(
                "destination enumeration is failing".to_string(),
            ));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MurmurError> {
        Ok(())
    }
}

#[async_trait]
impl TransportAdapter for MockTransport {
    fn platform(&self) -> &str {
        &self.platform
    }

    async fn destinations(&self) -> Result<DestinationStream, MurmurError> {
        if self.fail_enumeration.load(Ordering::SeqCst) {
            return Err(MurmurError::transport("mock enumeration failure"));
        }
        let items: Vec<Result<Destination, MurmurError>> =
            self.destinations.iter().cloned().map(Ok).collect();
        Ok(Box::pin(stream::iter(items)))
    }

    async fn sub_destinations(
        &self,
        destination: &str,
    ) -> Result<SubDestinationStream, MurmurError> {
        if self.fail_sub_enumeration.load(Ordering::SeqCst) {
            return Err(MurmurError::transport(format!(
                "mock sub-destination listing for `{destination}` failed"
            )));
        }
        let items: Vec<Result<SubDestination, MurmurError>> = self
            .sub_destinations
            .get(destination)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(Ok)
            .collect();
        Ok(Box::pin(stream::iter(items)))
    }

    async fn send(&self, target: &str, text: &str) -> Result<SentMessageId, MurmurError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.should_fail(target) {
            return Err(MurmurError::transport(format!("mock send to `{target}` rejected")));
        }
        self.sent.lock().await.push(SentMessage {
            target: target.to_string(),
            text: text.to_string(),
        });
        Ok(SentMessageId(format!("mock-msg-{}", uuid::Uuid::new_v4())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn send_captures_messages() {
        let transport = MockTransport::new("mock");
        let id = transport.send("g1", "hello").await.unwrap();
        assert!(id.0.starts_with("mock-msg-"));

        let sent = transport.sent_messages().await;
        assert_eq!(
            sent,
            vec![SentMessage {
                target: "g1".into(),
                text: "hello".into()
            }]
        );
    }

    #[tokio::test]
    async fn scripted_failures_are_counted_as_attempts() {
        let transport = MockTransport::new("mock").with_failing_target("bad");
        transport.fail_next_sends(1);

        assert!(transport.send("good", "a").await.is_err());
        assert!(transport.send("good", "b").await.is_ok());
        assert!(transport.send("bad", "c").await.is_err());
        assert_eq!(transport.send_attempts(), 3);
        assert_eq!(transport.sent_count().await, 1);
    }

    #[tokio::test]
    async fn enumeration_restarts_on_each_call() {
        let transport = MockTransport::new("mock").with_destinations(&["a", "b"]);
        for _ in 0..2 {
            let ids: Vec<String> = transport
                .destinations()
                .await
                .unwrap()
                .map(|d| d.unwrap().id)
                .collect()
                .await;
            assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
        }
    }

    #[tokio::test]
    async fn unknown_destination_has_no_sub_destinations() {
        let transport = MockTransport::new("mock");
        let subs: Vec<_> = transport.sub_destinations("x").await.unwrap().collect().await;
        assert!(subs.is_empty());
    }

    #[tokio::test]
    async fn sub_enumeration_failure_is_scriptable() {
        let transport = MockTransport::new("mock")
            .with_sub_destinations("g1", vec![SubDestination::text("general")]);
        transport.fail_sub_enumeration(true);
        assert!(transport.sub_destinations("g1").await.is_err());

        transport.fail_sub_enumeration(false);
        let subs: Vec<_> = transport.sub_destinations("g1").await.unwrap().collect().await;
        assert_eq!(subs.len(), 1);
    }

    #[tokio::test]
    async fn failing_enumeration_reports_unhealthy() {
        let transport = MockTransport::new("mock");
        assert_eq!(transport.health_check().await.unwrap(), HealthStatus::Healthy);

        transport.fail_enumeration(true);
        assert!(matches!(
            transport.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }

    #[test]
    fn identifies_as_transport_adapter() {
        let transport = MockTransport::new("mock");
        assert_eq!(transport.name(), "mock-transport");
        assert_eq!(transport.platform(), "mock");
        assert_eq!(transport.adapter_type(), AdapterType::Transport);
    }
}
