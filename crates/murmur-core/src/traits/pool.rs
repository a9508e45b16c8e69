// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repository trait for the message pool.

use async_trait::async_trait;

use crate::error::MurmurError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{MessageRecord, PoolFilter, Scope};

/// Persistence backend for pooled messages.
///
/// Implementations provide their own concurrency safety; the scheduler
/// and the operator operations may call into the same repository.
#[async_trait]
pub trait PoolRepository: PluginAdapter {
    /// Initializes the backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), MurmurError>;

    /// Closes the backend, flushing pending writes.
    async fn close(&self) -> Result<(), MurmurError>;

    /// Returns every record matching `filter`, ordered by id ascending.
    async fn find(&self, filter: &PoolFilter) -> Result<Vec<MessageRecord>, MurmurError>;

    /// Returns the record with the given id, if any.
    async fn get(&self, id: i64) -> Result<Option<MessageRecord>, MurmurError>;

    /// Inserts a record and returns its assigned id.
    ///
    /// Does not check for duplicates; callers use [`find`](Self::find) with
    /// [`PoolFilter::ExactText`] first.
    async fn insert(&self, text: &str, scope: &Scope) -> Result<i64, MurmurError>;

    /// Deletes the record with the given id. Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool, MurmurError>;

    /// Returns one page of matching records, newest (highest id) first.
    async fn paginate(
        &self,
        filter: &PoolFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<MessageRecord>, MurmurError>;

    /// Counts matching records.
    async fn count(&self, filter: &PoolFilter) -> Result<u64, MurmurError>;
}
