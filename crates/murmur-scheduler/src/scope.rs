// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Which destinations a transport endpoint broadcasts to.

use std::collections::HashMap;

use futures::StreamExt;
use murmur_core::{MurmurError, TransportAdapter};
use tracing::warn;

/// Resolved scope of a single endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationScope {
    /// No entry for the endpoint: every destination it can see.
    Dynamic,
    /// Explicit list of destination ids.
    Explicit(Vec<String>),
    /// Entry present but blank: the endpoint is skipped.
    Disabled,
}

impl DestinationScope {
    /// Parse a configured value such as `"g1, g2"`.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return DestinationScope::Disabled;
        }
        let ids: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();
        if ids.is_empty() {
            DestinationScope::Disabled
        } else {
            DestinationScope::Explicit(ids)
        }
    }

    /// Look up `platform` in the `[destinations]` table.
    pub fn for_platform(table: &HashMap<String, String>, platform: &str) -> Self {
        table
            .get(platform)
            .map_or(DestinationScope::Dynamic, |raw| Self::parse(raw))
    }
}

/// Materialize the destination list for an endpoint.
///
/// Dynamic enumeration stops after `max_destinations` entries. Individual
/// enumeration errors abort the whole resolution.
pub async fn resolve_destinations(
    transport: &dyn TransportAdapter,
    scope: &DestinationScope,
    max_destinations: usize,
) -> Result<Vec<String>, MurmurError> {
    match scope {
        DestinationScope::Disabled => Ok(Vec::new()),
        DestinationScope::Explicit(ids) => Ok(ids.clone()),
        DestinationScope::Dynamic => {
            let mut stream = transport.destinations().await?;
            let mut ids = Vec::new();
            while let Some(destination) = stream.next().await {
                if ids.len() >= max_destinations {
                    warn!(
                        platform = transport.platform(),
                        max_destinations, "destination enumeration truncated"
                    );
                    break;
                }
                ids.push(destination?.id);
            }
            Ok(ids)
        }
    }
}
