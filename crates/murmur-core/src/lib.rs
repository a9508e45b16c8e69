// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for murmur.
//!
//! This crate provides the trait definitions, error type, and domain types
//! shared by the scheduler, the message pool storage, and transport
//! adapters.

pub mod error;
pub mod traits;
pub mod types;

pub use error::MurmurError;
pub use types::{
    AdapterType, Destination, HealthStatus, MessageRecord, PoolFilter, Scope, SentMessageId,
    SubDestination, SubDestinationKind, GLOBAL_SCOPE,
};

pub use traits::{
    DestinationStream, PluginAdapter, PoolRepository, SubDestinationStream, TransportAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn murmur_error_kinds() {
        assert_eq!(MurmurError::Config("x".into()).kind(), "Config");
        assert_eq!(MurmurError::transport("boom").kind(), "Transport");
        assert_eq!(
            MurmurError::Storage {
                source: Box::new(std::io::Error::other("disk")),
            }
            .kind(),
            "Storage"
        );
        assert_eq!(
            MurmurError::PermissionDenied {
                operator: "mallory".into()
            }
            .to_string(),
            "permission denied for operator `mallory`"
        );
    }

    #[test]
    fn adapter_type_display_and_parse() {
        use std::str::FromStr;

        for variant in [
            AdapterType::Transport,
            AdapterType::Storage,
            AdapterType::Observability,
        ] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn global_scope_sentinel() {
        assert_eq!(Scope::parse("global"), Scope::Global);
        assert_eq!(Scope::Global.as_str(), GLOBAL_SCOPE);
        assert!(Scope::Global.is_global());
        assert_eq!(
            Scope::parse("guild-7"),
            Scope::Destination("guild-7".into())
        );
    }

    #[test]
    fn scope_serializes_as_plain_string() {
        let json = serde_json::to_string(&Scope::Global).unwrap();
        assert_eq!(json, "\"global\"");
        let scope: Scope = serde_json::from_str("\"g1\"").unwrap();
        assert_eq!(scope, Scope::Destination("g1".into()));
    }

    #[test]
    fn only_text_sub_destinations_are_text() {
        assert!(SubDestination::text("c1").is_text());
        let voice = SubDestination {
            id: "v1".into(),
            kind: SubDestinationKind::Voice,
        };
        assert!(!voice.is_text());
        assert_eq!(SubDestinationKind::Text.to_string(), "text");
    }

    #[test]
    fn destination_filter_includes_global_records() {
        let record = |scope: Scope| MessageRecord {
            id: 1,
            text: "hi".into(),
            scope,
        };
        let filter = PoolFilter::ForDestination("g1".into());
        assert!(filter.matches(&record(Scope::Global)));
        assert!(filter.matches(&record(Scope::Destination("g1".into()))));
        assert!(!filter.matches(&record(Scope::Destination("g2".into()))));

        let exact = PoolFilter::ExactText(Scope::Global, "hi".into());
        assert!(exact.matches(&record(Scope::Global)));
        assert!(!exact.matches(&record(Scope::Destination("g1".into()))));
    }

    proptest! {
        #[test]
        fn non_sentinel_scopes_are_destinations(raw in "[a-z0-9_-]{1,16}") {
            prop_assume!(raw != GLOBAL_SCOPE);
            let scope = Scope::parse(&raw);
            prop_assert_eq!(scope.as_str(), raw.as_str());
            prop_assert!(!scope.is_global());
        }
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_transport_adapter<T: TransportAdapter>() {}
        fn _assert_pool_repository<T: PoolRepository>() {}
    }
}
