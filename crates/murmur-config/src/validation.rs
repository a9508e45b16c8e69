// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as interval ordering, non-empty paths, and positive page sizes.

use crate::diagnostic::ConfigError;
use crate::model::MurmurConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &MurmurConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let schedule = &config.schedule;
    if schedule.max_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "schedule.max_interval_secs must be greater than 0".to_string(),
        });
    }

    if schedule.min_interval_secs > schedule.max_interval_secs {
        errors.push(ConfigError::Validation {
            message: format!(
                "schedule.min_interval_secs ({}) must not exceed schedule.max_interval_secs ({})",
                schedule.min_interval_secs, schedule.max_interval_secs
            ),
        });
    }

    if schedule.max_destinations == 0 {
        errors.push(ConfigError::Validation {
            message: "schedule.max_destinations must be at least 1".to_string(),
        });
    }

    if config.pool.page_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "pool.page_limit must be at least 1".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let level = config.daemon.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "daemon.log_level `{}` is not one of {}",
                config.daemon.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.console.enabled && config.console.destinations.is_empty() {
        errors.push(ConfigError::Validation {
            message: "console.destinations must not be empty when the console transport is enabled"
                .to_string(),
        });
    }

    if config.prometheus.enabled
        && config
            .prometheus
            .listen_addr
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "prometheus.listen_addr `{}` is not a valid socket address",
                config.prometheus.listen_addr
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
