// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory `PoolRepository` for tests that do not need SQLite.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use murmur_core::traits::adapter::PluginAdapter;
use murmur_core::traits::pool::PoolRepository;
use murmur_core::types::{AdapterType, HealthStatus, MessageRecord, PoolFilter, Scope};
use murmur_core::MurmurError;

#[derive(Default)]
struct Inner {
    records: Vec<MessageRecord>,
    next_id: i64,
}

/// Message pool kept in a `Vec`, ids assigned from 1 upward.
///
/// `fail_reads(true)` makes `find`, `paginate` and `count` return a storage
/// error so retry paths can be exercised.
#[derive(Default)]
pub struct MemoryPool {
    inner: Mutex<Inner>,
    fail_reads: AtomicBool,
}

impl MemoryPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record directly, bypassing duplicate and permission checks.
    pub async fn seed(&self, text: &str, scope: Scope) -> i64 {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let id = inner.next_id;
        inner.records.push(MessageRecord {
            id,
            text: text.to_string(),
            scope,
        });
        id
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub async fn records(&self) -> Vec<MessageRecord> {
        self.inner.lock().await.records.clone()
    }

    fn check_reads(&self) -> Result<(), MurmurError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(MurmurError::Storage {
                source: "memory pool read failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for MemoryPool {
    fn name(&self) -> &str {
        "memory-pool"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, MurmurError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MurmurError> {
        Ok(())
    }
}

#[async_trait]
impl PoolRepository for MemoryPool {
    async fn initialize(&self) -> Result<(), MurmurError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), MurmurError> {
        Ok(())
    }

    async fn find(&self, filter: &PoolFilter) -> Result<Vec<MessageRecord>, MurmurError> {
        self.check_reads()?;
        let inner = self.inner.lock().await;
        Ok(inner
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn get(&self, id: i64) -> Result<Option<MessageRecord>, MurmurError> {
        Ok(self.find(&PoolFilter::Id(id)).await?.into_iter().next())
    }

    async fn insert(&self, text: &str, scope: &Scope) -> Result<i64, MurmurError> {
        Ok(self.seed(text, scope.clone()).await)
    }

    async fn delete(&self, id: i64) -> Result<bool, MurmurError> {
        let mut inner = self.inner.lock().await;
        let before = inner.records.len();
        inner.records.retain(|r| r.id != id);
        Ok(inner.records.len() != before)
    }

    async fn paginate(
        &self,
        filter: &PoolFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<MessageRecord>, MurmurError> {
        let mut matching = self.find(filter).await?;
        matching.reverse();
        Ok(matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .collect())
    }

    async fn count(&self, filter: &PoolFilter) -> Result<u64, MurmurError> {
        Ok(self.find(filter).await?.len() as u64)
    }
}
