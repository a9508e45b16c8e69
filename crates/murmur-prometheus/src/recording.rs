// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics.

use metrics::{describe_counter, describe_gauge};

pub const BROADCASTS_TOTAL: &str = "murmur_broadcasts_total";
pub const SEND_ATTEMPTS_TOTAL: &str = "murmur_send_attempts_total";
pub const POOL_SIZE: &str = "murmur_pool_size";

/// Register all murmur metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        BROADCASTS_TOTAL,
        "Broadcast rounds per endpoint, by outcome"
    );
    describe_counter!(
        SEND_ATTEMPTS_TOTAL,
        "Transport send calls, by kind (direct or fallback) and result"
    );
    describe_gauge!(
        POOL_SIZE,
        "Candidate messages seen by the most recent selection"
    );
}

/// Record the outcome of one endpoint's broadcast round.
pub fn record_broadcast(platform: &str, outcome: &'static str) {
    metrics::counter!(
        BROADCASTS_TOTAL,
        "platform" => platform.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a single send call.
pub fn record_send_attempt(platform: &str, kind: &'static str, ok: bool) {
    let result = if ok { "ok" } else { "error" };
    metrics::counter!(
        SEND_ATTEMPTS_TOTAL,
        "platform" => platform.to_string(),
        "kind" => kind,
        "result" => result
    )
    .increment(1);
}

/// Set the candidate pool size seen by the latest selection.
///
/// Unlabelled: destinations are unbounded under dynamic enumeration.
pub fn set_pool_size(size: f64) {
    metrics::gauge!(POOL_SIZE).set(size);
}
