// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and murmur crates.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Sentinel scope value stored for messages that apply to every destination.
pub const GLOBAL_SCOPE: &str = "global";

/// Identifier returned by a transport for a delivered message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SentMessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Transport,
    Storage,
    Observability,
}

/// Applicability tag of a pooled message.
///
/// Stored as the plain string `"global"` or the destination identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Scope {
    /// Eligible for every destination.
    Global,
    /// Eligible only for the named destination.
    Destination(String),
}

impl Scope {
    /// Parse a stored scope string.
    pub fn parse(raw: &str) -> Self {
        if raw == GLOBAL_SCOPE {
            Scope::Global
        } else {
            Scope::Destination(raw.to_string())
        }
    }

    /// The stored representation of this scope.
    pub fn as_str(&self) -> &str {
        match self {
            Scope::Global => GLOBAL_SCOPE,
            Scope::Destination(id) => id.as_str(),
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Scope::Global)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Scope {
    fn from(raw: String) -> Self {
        if raw == GLOBAL_SCOPE {
            Scope::Global
        } else {
            Scope::Destination(raw)
        }
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Global => GLOBAL_SCOPE.to_string(),
            Scope::Destination(id) => id,
        }
    }
}

/// A pooled message as stored by a [`PoolRepository`](crate::PoolRepository).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: i64,
    pub text: String,
    pub scope: Scope,
}

/// Query filter understood by pool repositories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolFilter {
    /// Every record that applies to a destination: scope `global` OR scope `id`.
    ForDestination(String),
    /// Records stored under exactly this scope.
    Exact(Scope),
    /// Records with this exact text under exactly this scope (duplicate checks).
    ExactText(Scope, String),
    /// The record with this id.
    Id(i64),
}

impl PoolFilter {
    /// Whether `record` satisfies this filter.
    pub fn matches(&self, record: &MessageRecord) -> bool {
        match self {
            PoolFilter::ForDestination(id) => {
                record.scope.is_global() || record.scope.as_str() == id
            }
            PoolFilter::Exact(scope) => &record.scope == scope,
            PoolFilter::ExactText(scope, text) => &record.scope == scope && &record.text == text,
            PoolFilter::Id(id) => record.id == *id,
        }
    }
}

/// A top-level recipient group reachable through a transport endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub id: String,
    pub name: Option<String>,
}

impl Destination {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// Kind of a sub-destination. Only [`SubDestinationKind::Text`] is a fallback target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubDestinationKind {
    Text,
    Voice,
    Category,
    Other,
}

/// A channel within a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubDestination {
    pub id: String,
    pub kind: SubDestinationKind,
}

impl SubDestination {
    pub fn text(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: SubDestinationKind::Text,
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind == SubDestinationKind::Text
    }
}
