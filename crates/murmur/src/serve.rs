// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `murmur serve` command implementation.
//!
//! Opens the SQLite message pool, registers the configured transports and
//! runs the scheduler until SIGINT/SIGTERM, or for a single round with
//! `--once`.

use std::sync::Arc;

use murmur_config::MurmurConfig;
use murmur_core::{HealthStatus, MurmurError, PoolRepository, TransportAdapter};
use murmur_scheduler::{shutdown, Scheduler};
use murmur_storage::SqliteMessagePool;
use tracing::{debug, info, warn};

use crate::transport::ConsoleTransport;

/// Runs the `murmur serve` command.
pub async fn run_serve(config: MurmurConfig, once: bool) -> Result<(), MurmurError> {
    info!("starting murmur serve");

    let pool = Arc::new(SqliteMessagePool::new(config.storage.clone()));
    pool.initialize().await?;

    #[cfg(feature = "prometheus")]
    let prometheus_adapter = if config.prometheus.enabled {
        match start_prometheus(&config.prometheus) {
            Ok(adapter) => {
                info!("prometheus metrics enabled");
                Some(adapter)
            }
            Err(e) => {
                warn!(error = %e, "prometheus initialization failed, continuing without metrics");
                None
            }
        }
    } else {
        debug!("prometheus metrics disabled by configuration");
        None
    };

    let transports = build_transports(&config);
    if transports.is_empty() {
        warn!("no transports enabled, broadcasts will be skipped");
    }

    let cancel = shutdown::install_signal_handler();
    let mut scheduler = Scheduler::new(&config, pool.clone(), transports.clone());
    match scheduler.health_check().await {
        Ok(HealthStatus::Healthy) => debug!("all transports healthy"),
        Ok(status) => warn!(?status, "transports are not fully healthy"),
        Err(e) => warn!(error = %e, "transport health check failed"),
    }

    if once {
        let reports = scheduler.run_once(&cancel).await;
        for report in &reports {
            info!(platform = %report.platform, outcome = report.result.label(), "round result");
        }
        cancel.cancel();
    } else {
        scheduler.run(&cancel).await;
    }

    for transport in &transports {
        if let Err(e) = transport.shutdown().await {
            warn!(transport = transport.name(), error = %e, "transport shutdown failed");
        }
    }
    #[cfg(feature = "prometheus")]
    if let Some(adapter) = &prometheus_adapter
        && let Err(e) = murmur_core::PluginAdapter::shutdown(adapter).await
    {
        warn!(error = %e, "prometheus shutdown failed");
    }
    pool.close().await?;
    info!("murmur stopped");
    Ok(())
}

#[cfg(feature = "prometheus")]
fn start_prometheus(
    config: &murmur_config::model::PrometheusConfig,
) -> Result<murmur_prometheus::PrometheusAdapter, MurmurError> {
    let addr = config.listen_addr.parse().map_err(|e| {
        MurmurError::Config(format!(
            "prometheus.listen_addr `{}` is invalid: {e}",
            config.listen_addr
        ))
    })?;
    murmur_prometheus::PrometheusAdapter::new(addr)
}

/// Transports enabled by configuration, in registration order.
fn build_transports(config: &MurmurConfig) -> Vec<Arc<dyn TransportAdapter>> {
    let mut transports: Vec<Arc<dyn TransportAdapter>> = Vec::new();
    if config.console.enabled {
        transports.push(Arc::new(ConsoleTransport::new(&config.console)));
    }
    transports
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("murmur={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
