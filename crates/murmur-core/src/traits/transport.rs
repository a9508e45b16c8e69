// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport adapter trait for connected messaging accounts (bots, sessions).

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::MurmurError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Destination, SentMessageId, SubDestination};

/// Lazy, finite sequence of destinations produced by a transport.
pub type DestinationStream =
    Pin<Box<dyn Stream<Item = Result<Destination, MurmurError>> + Send>>;

/// Lazy, finite sequence of sub-destinations within one destination.
pub type SubDestinationStream =
    Pin<Box<dyn Stream<Item = Result<SubDestination, MurmurError>> + Send>>;

/// One transport endpoint: a connected account able to enumerate
/// destinations and send text to them.
///
/// Each call to [`destinations`](TransportAdapter::destinations) or
/// [`sub_destinations`](TransportAdapter::sub_destinations) starts a fresh
/// enumeration.
#[async_trait]
pub trait TransportAdapter: PluginAdapter {
    /// Platform key of this endpoint, used to look up its destination scope.
    fn platform(&self) -> &str;

    /// Enumerates every top-level destination this endpoint can reach.
    async fn destinations(&self) -> Result<DestinationStream, MurmurError>;

    /// Enumerates the sub-destinations (channels) of a destination.
    async fn sub_destinations(
        &self,
        destination: &str,
    ) -> Result<SubDestinationStream, MurmurError>;

    /// Sends `text` to a destination or sub-destination.
    async fn send(&self, target: &str, text: &str) -> Result<SentMessageId, MurmurError>;
}
