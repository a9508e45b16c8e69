// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dry-run transport that logs broadcasts instead of delivering them.

use async_trait::async_trait;
use futures::stream;
use tracing::info;

use murmur_config::model::ConsoleConfig;
use murmur_core::traits::transport::{DestinationStream, SubDestinationStream};
use murmur_core::types::{AdapterType, Destination, HealthStatus, SentMessageId, SubDestination};
use murmur_core::{MurmurError, PluginAdapter, TransportAdapter};

/// Transport endpoint backed by the `[console]` config section.
///
/// Every configured destination exposes the configured channels as text
/// sub-destinations named `destination/channel`.
pub struct ConsoleTransport {
    destinations: Vec<String>,
    channels: Vec<String>,
}

impl ConsoleTransport {
    pub fn new(config: &ConsoleConfig) -> Self {
        Self {
            destinations: config.destinations.clone(),
            channels: config.channels.clone(),
        }
    }
}

#[async_trait]
impl PluginAdapter for ConsoleTransport {
    fn name(&self) -> &str {
        "console"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, MurmurError> {
        if self.destinations.is_empty() {
            return Ok(HealthStatus::Degraded("no destinations configured".to_string()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MurmurError> {
        Ok(())
    }
}

#[async_trait]
impl TransportAdapter for ConsoleTransport {
    fn platform(&self) -> &str {
        "console"
    }

    async fn destinations(&self) -> Result<DestinationStream, MurmurError> {
        let items: Vec<Result<Destination, MurmurError>> = self
            .destinations
            .iter()
            .map(|id| Ok(Destination::new(id.as_str())))
            .collect();
        Ok(Box::pin(stream::iter(items)))
    }

    async fn sub_destinations(
        &self,
        destination: &str,
    ) -> Result<SubDestinationStream, MurmurError> {
        if !self.destinations.iter().any(|d| d == destination) {
            return Err(MurmurError::NotFound {
                entity: "destination".to_string(),
                id: destination.to_string(),
            });
        }
        let items: Vec<Result<SubDestination, MurmurError>> = self
            .channels
            .iter()
            .map(|channel| Ok(SubDestination::text(format!("{destination}/{channel}"))))
            .collect();
        Ok(Box::pin(stream::iter(items)))
    }

    async fn send(&self, target: &str, text: &str) -> Result<SentMessageId, MurmurError> {
        let id = uuid::Uuid::new_v4().to_string();
        info!(target = %target, message_id = %id, "{text}");
        Ok(SentMessageId(id))
    }
}
