// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./murmur.toml` > `~/.config/murmur/murmur.toml` > `/etc/murmur/murmur.toml`
//! with environment variable overrides via `MURMUR_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::MurmurConfig;

/// Top-level sections that environment variables can address.
const SECTIONS: &[&str] = &[
    "daemon",
    "schedule",
    "delivery",
    "pool",
    "storage",
    "destinations",
    "console",
    "prometheus",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/murmur/murmur.toml` (system-wide)
/// 3. `~/.config/murmur/murmur.toml` (user XDG config)
/// 4. `./murmur.toml` (local directory)
/// 5. `MURMUR_*` environment variables
pub fn load_config() -> Result<MurmurConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<MurmurConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MurmurConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MurmurConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MurmurConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MurmurConfig::default()))
        .merge(Toml::file("/etc/murmur/murmur.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("murmur/murmur.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("murmur.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider mapping `section_key` to `section.key`.
///
/// Only the leading section name is split off so that underscore-containing
/// keys survive: `MURMUR_DELIVERY_MAX_RETRY` maps to `delivery.max_retry`.
fn env_provider() -> Env {
    Env::prefixed("MURMUR_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a prefix-stripped env key to a dotted config path.
///
/// figment hands over the key in its original case, so matching is done on
/// the lowercased form.
fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}
