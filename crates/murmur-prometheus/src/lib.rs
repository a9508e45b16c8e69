// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics adapter for murmur.
//!
//! Uses the metrics-rs facade with the Prometheus exporter. The scheduler
//! records through the helpers in [`recording`]; the adapter installs the
//! global recorder and serves the Prometheus text format over HTTP.

pub mod recording;

use std::net::SocketAddr;

use async_trait::async_trait;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use murmur_core::traits::adapter::PluginAdapter;
use murmur_core::types::{AdapterType, HealthStatus};
use murmur_core::MurmurError;

pub use recording::{record_broadcast, record_send_attempt, register_metrics, set_pool_size};

/// Prometheus metrics adapter.
///
/// Owns the exporter's scrape listener task and a handle for rendering the
/// collected metrics in-process.
pub struct PrometheusAdapter {
    handle: PrometheusHandle,
    server: Option<JoinHandle<()>>,
}

impl PrometheusAdapter {
    /// Install the Prometheus recorder globally and start serving scrapes
    /// on `listen_addr`.
    ///
    /// Must be called from within a Tokio runtime. Only one recorder can be
    /// installed per process; a second call fails.
    pub fn new(listen_addr: SocketAddr) -> Result<Self, MurmurError> {
        let (recorder, exporter) = PrometheusBuilder::new()
            .with_http_listener(listen_addr)
            .build()
            .map_err(|e| {
                MurmurError::Internal(format!("failed to build Prometheus exporter: {e}"))
            })?;
        let handle = recorder.handle();
        metrics::set_global_recorder(recorder).map_err(|_| {
            MurmurError::Internal("a global metrics recorder is already installed".to_string())
        })?;

        let server = tokio::spawn(async move {
            if let Err(e) = exporter.await {
                warn!(error = ?e, "prometheus exporter stopped");
            }
        });

        recording::register_metrics();

        info!(%listen_addr, "prometheus exporter listening");

        Ok(Self {
            handle,
            server: Some(server),
        })
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[async_trait]
impl PluginAdapter for PrometheusAdapter {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Observability
    }

    async fn health_check(&self) -> Result<HealthStatus, MurmurError> {
        match &self.server {
            Some(server) if server.is_finished() => Ok(HealthStatus::Unhealthy(
                "scrape listener is not running".to_string(),
            )),
            _ => Ok(HealthStatus::Healthy),
        }
    }

    async fn shutdown(&self) -> Result<(), MurmurError> {
        if let Some(server) = &self.server {
            server.abort();
        }
        Ok(())
    }
}
