// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod pool;
pub mod transport;

pub use adapter::PluginAdapter;
pub use pool::PoolRepository;
pub use transport::{DestinationStream, SubDestinationStream, TransportAdapter};
