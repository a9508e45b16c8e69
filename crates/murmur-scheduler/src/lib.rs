// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast scheduling for murmur.
//!
//! The [`Scheduler`] is the central coordinator that:
//! - Waits a random interval between the configured bounds
//! - Resolves each transport endpoint's destinations
//! - Hands each endpoint to a [`DeliveryOrchestrator`], which picks a
//!   message through the [`SelectionEngine`] and retries with fallback
//! - Stops cleanly when its cancellation token fires
//!
//! The [`operations`] module holds the operator commands that edit the
//! message pool.

pub mod countdown;
pub mod delivery;
pub mod last_sent;
pub mod operations;
pub mod scheduler;
pub mod scope;
pub mod selection;
pub mod shutdown;

pub use countdown::{wait_interval, Countdown, WaitOutcome};
pub use delivery::{
    DeliveryFailure, DeliveryOrchestrator, DeliveryOutcome, DeliveryPolicy, DeliveryState,
    RetryBudget,
};
pub use last_sent::LastSentCache;
pub use operations::{
    add_message, list_page, remove_message, AddOutcome, ListPage, ListStatus, RemoveOutcome,
};
pub use scheduler::{EndpointReport, EndpointResult, Scheduler, SchedulerState};
pub use scope::{resolve_destinations, DestinationScope};
pub use selection::{candidate_pool, SelectionEngine, SelectionError};
pub use shutdown::install_signal_handler;
