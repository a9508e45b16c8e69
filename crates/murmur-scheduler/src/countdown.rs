// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cancellable interval wait with an optional per-second countdown.

use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Cancelled,
}

/// Publishes the seconds remaining until the next broadcast.
///
/// Receivers see `None` while no wait is in progress.
#[derive(Debug)]
pub struct Countdown {
    tx: watch::Sender<Option<u64>>,
}

impl Countdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<u64>> {
        self.tx.subscribe()
    }

    /// Tick from `secs` down to zero, one value per second.
    async fn run(&self, secs: u64) {
        for remaining in (0..=secs).rev() {
            self.tx.send_replace(Some(remaining));
            trace!(remaining, "next broadcast countdown");
            if remaining > 0 {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }

    fn clear(&self) {
        self.tx.send_replace(None);
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Sleep for `duration` unless `cancel` fires first.
///
/// When a countdown is given it ticks alongside the sleep and stops with it.
pub async fn wait_interval(
    duration: Duration,
    cancel: &CancellationToken,
    countdown: Option<&Countdown>,
) -> WaitOutcome {
    let ticker = async {
        if let Some(countdown) = countdown {
            countdown.run(duration.as_secs()).await;
        }
        std::future::pending::<()>().await
    };

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => WaitOutcome::Cancelled,
        _ = ticker => WaitOutcome::Elapsed,
        _ = tokio::time::sleep(duration) => WaitOutcome::Elapsed,
    };

    if let Some(countdown) = countdown {
        countdown.clear();
    }
    outcome
}
