// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for murmur.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level murmur configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MurmurConfig {
    /// Process-level settings.
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Broadcast interval settings.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Retry and repeat-avoidance settings.
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Message pool settings.
    #[serde(default)]
    pub pool: PoolConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Destination scope per transport platform.
    ///
    /// A missing key means "every destination the endpoint can enumerate",
    /// an empty value means "never broadcast on this endpoint", otherwise a
    /// comma-separated list of destination ids.
    #[serde(default)]
    pub destinations: HashMap<String, String>,

    /// Dry-run console transport settings.
    #[serde(default)]
    pub console: ConsoleConfig,

    /// Prometheus metrics settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Broadcast interval configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Minimum seconds between broadcasts (inclusive).
    #[serde(default = "default_min_interval_secs")]
    pub min_interval_secs: u64,

    /// Maximum seconds between broadcasts (inclusive).
    #[serde(default = "default_max_interval_secs")]
    pub max_interval_secs: u64,

    /// Publish a remaining-seconds countdown while waiting.
    #[serde(default = "default_countdown")]
    pub countdown: bool,

    /// Upper bound on destinations collected from dynamic enumeration.
    #[serde(default = "default_max_destinations")]
    pub max_destinations: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: default_min_interval_secs(),
            max_interval_secs: default_max_interval_secs(),
            countdown: default_countdown(),
            max_destinations: default_max_destinations(),
        }
    }
}

fn default_min_interval_secs() -> u64 {
    60
}

fn default_max_interval_secs() -> u64 {
    300
}

fn default_countdown() -> bool {
    true
}

fn default_max_destinations() -> usize {
    10_000
}

/// Retry and repeat-avoidance configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryConfig {
    /// Never send the same message twice in a row to one destination.
    #[serde(default)]
    pub no_repeat: bool,

    /// Retries after the first failed attempt before giving up for the round.
    #[serde(default = "default_max_retry")]
    pub max_retry: u32,

    /// Delay between retries in milliseconds.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// Log full error chains instead of a one-line summary.
    #[serde(default)]
    pub debug_mode: bool,
}

impl DeliveryConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            no_repeat: false,
            max_retry: default_max_retry(),
            retry_interval_ms: default_retry_interval_ms(),
            debug_mode: false,
        }
    }
}

fn default_max_retry() -> u32 {
    5
}

fn default_retry_interval_ms() -> u64 {
    500
}

/// Message pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    /// Operator ids allowed to add and remove pooled messages.
    #[serde(default)]
    pub admins: Vec<String>,

    /// Messages eligible for every destination. Not stored and not listed.
    #[serde(default)]
    pub global_messages: Vec<String>,

    /// Entries per page when listing.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            admins: Vec::new(),
            global_messages: Vec::new(),
            page_limit: default_page_limit(),
        }
    }
}

fn default_page_limit() -> u32 {
    5
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("murmur").join("murmur.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("murmur.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Dry-run console transport.
///
/// Sends are written to the log instead of a real network. Useful for
/// trying out pool contents and schedules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Register the console transport when serving.
    #[serde(default = "default_console_enabled")]
    pub enabled: bool,

    /// Destinations the console transport pretends to reach.
    #[serde(default = "default_console_destinations")]
    pub destinations: Vec<String>,

    /// Text channels reported inside every console destination.
    #[serde(default = "default_console_channels")]
    pub channels: Vec<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: default_console_enabled(),
            destinations: default_console_destinations(),
            channels: default_console_channels(),
        }
    }
}

fn default_console_enabled() -> bool {
    true
}

fn default_console_destinations() -> Vec<String> {
    vec!["lobby".to_string()]
}

fn default_console_channels() -> Vec<String> {
    vec!["general".to_string()]
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    /// Install the Prometheus recorder and exporter at startup.
    #[serde(default)]
    pub enabled: bool,

    /// Socket address the `/metrics` scrape endpoint listens on.
    #[serde(default = "default_prometheus_listen_addr")]
    pub listen_addr: String,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: default_prometheus_listen_addr(),
        }
    }
}

fn default_prometheus_listen_addr() -> String {
    "127.0.0.1:9464".to_string()
}
