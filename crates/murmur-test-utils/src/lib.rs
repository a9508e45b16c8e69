// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for murmur integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without a real messaging platform.
//!
//! # Components
//!
//! - [`MockTransport`] - Mock transport endpoint with scriptable failures and send capture
//! - [`MemoryPool`] - In-memory message pool
//! - [`TestHarness`] - Config, pool and transport assembled for scheduler tests

pub mod harness;
pub mod memory_pool;
pub mod mock_transport;

pub use harness::{TestHarness, TestHarnessBuilder, MOCK_PLATFORM};
pub use memory_pool::MemoryPool;
pub use mock_transport::{MockTransport, SentMessage};
