// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end scheduler testing.
//!
//! `TestHarness` assembles a config, a message pool (in memory or a temp
//! SQLite file) and a `MockTransport`, ready to hand to a scheduler.

use std::sync::Arc;

use murmur_config::model::{MurmurConfig, StorageConfig};
use murmur_core::types::{Scope, SubDestination};
use murmur_core::{MurmurError, PoolRepository, TransportAdapter};
use murmur_storage::SqliteMessagePool;

use crate::memory_pool::MemoryPool;
use crate::mock_transport::MockTransport;

/// Platform key used by the harness transport.
pub const MOCK_PLATFORM: &str = "mock";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: MurmurConfig,
    records: Vec<(String, Scope)>,
    destinations: Vec<String>,
    sub_destinations: Vec<(String, Vec<SubDestination>)>,
    sqlite: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = MurmurConfig::default();
        config.schedule.countdown = false;
        config.delivery.retry_interval_ms = 10;
        Self {
            config,
            records: Vec::new(),
            destinations: Vec::new(),
            sub_destinations: Vec::new(),
            sqlite: false,
        }
    }

    /// Store a record in the pool before the test starts.
    pub fn with_record(mut self, text: &str, scope: Scope) -> Self {
        self.records.push((text.to_string(), scope));
        self
    }

    pub fn with_global_messages(mut self, messages: &[&str]) -> Self {
        self.config.pool.global_messages = messages.iter().map(|m| m.to_string()).collect();
        self
    }

    /// Destinations the mock transport reports when enumerated.
    pub fn with_destinations(mut self, ids: &[&str]) -> Self {
        self.destinations = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn with_sub_destinations(mut self, destination: &str, subs: Vec<SubDestination>) -> Self {
        self.sub_destinations.push((destination.to_string(), subs));
        self
    }

    /// Configured scope for the mock platform (`"g1,g2"`, `""`, ...).
    pub fn with_scope(mut self, raw: &str) -> Self {
        self.config
            .destinations
            .insert(MOCK_PLATFORM.to_string(), raw.to_string());
        self
    }

    pub fn with_interval(mut self, min_secs: u64, max_secs: u64) -> Self {
        self.config.schedule.min_interval_secs = min_secs;
        self.config.schedule.max_interval_secs = max_secs;
        self
    }

    pub fn with_max_retry(mut self, max_retry: u32) -> Self {
        self.config.delivery.max_retry = max_retry;
        self
    }

    pub fn with_no_repeat(mut self, no_repeat: bool) -> Self {
        self.config.delivery.no_repeat = no_repeat;
        self
    }

    /// Back the pool with a SQLite file in a temp directory.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    /// Build the test harness, seeding the pool.
    pub async fn build(mut self) -> Result<TestHarness, MurmurError> {
        let mut temp_dir = None;
        let pool: Arc<dyn PoolRepository> = if self.sqlite {
            let dir = tempfile::TempDir::new().map_err(|e| MurmurError::Storage {
                source: Box::new(e),
            })?;
            let storage = StorageConfig {
                database_path: dir.path().join("test.db").to_string_lossy().to_string(),
                wal_mode: true,
            };
            self.config.storage = storage.clone();
            temp_dir = Some(dir);
            Arc::new(SqliteMessagePool::new(storage))
        } else {
            Arc::new(MemoryPool::new())
        };
        pool.initialize().await?;

        for (text, scope) in &self.records {
            pool.insert(text, scope).await?;
        }

        let ids: Vec<&str> = self.destinations.iter().map(String::as_str).collect();
        let mut transport = MockTransport::new(MOCK_PLATFORM).with_destinations(&ids);
        for (destination, subs) in self.sub_destinations {
            transport = transport.with_sub_destinations(&destination, subs);
        }

        Ok(TestHarness {
            config: self.config,
            pool,
            transport: Arc::new(transport),
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock transport.
pub struct TestHarness {
    pub config: MurmurConfig,
    pub pool: Arc<dyn PoolRepository>,
    pub transport: Arc<MockTransport>,
    _temp_dir: Option<tempfile::TempDir>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The transport list to register with a scheduler.
    pub fn transports(&self) -> Vec<Arc<dyn TransportAdapter>> {
        vec![self.transport.clone() as Arc<dyn TransportAdapter>]
    }
}
