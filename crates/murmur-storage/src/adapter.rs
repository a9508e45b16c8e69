// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the PoolRepository trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use murmur_config::model::StorageConfig;
use murmur_core::types::{MessageRecord, PoolFilter, Scope};
use murmur_core::{AdapterType, HealthStatus, MurmurError, PluginAdapter, PoolRepository};

use crate::database::{map_tr_err, Database};
use crate::queries;

/// SQLite-backed message pool.
///
/// The database is opened lazily by [`PoolRepository::initialize`]; every
/// other operation fails until then.
pub struct SqliteMessagePool {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteMessagePool {
    /// Create a new pool with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, MurmurError> {
        self.db.get().ok_or_else(|| MurmurError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(&self, db: &Database) -> Result<(), MurmurError> {
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteMessagePool {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, MurmurError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("storage not initialized".to_string()));
        };
        let probe = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err);
        match probe {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("database unreachable: {e}"))),
        }
    }

    async fn shutdown(&self) -> Result<(), MurmurError> {
        if let Some(db) = self.db.get() {
            self.checkpoint(db).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl PoolRepository for SqliteMessagePool {
    async fn initialize(&self) -> Result<(), MurmurError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| MurmurError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "message pool initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), MurmurError> {
        let db = self.db()?;
        self.checkpoint(db).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn find(&self, filter: &PoolFilter) -> Result<Vec<MessageRecord>, MurmurError> {
        queries::pool::find(self.db()?, filter).await
    }

    async fn get(&self, id: i64) -> Result<Option<MessageRecord>, MurmurError> {
        queries::pool::get(self.db()?, id).await
    }

    async fn insert(&self, text: &str, scope: &Scope) -> Result<i64, MurmurError> {
        queries::pool::insert(self.db()?, text, scope).await
    }

    async fn delete(&self, id: i64) -> Result<bool, MurmurError> {
        queries::pool::delete(self.db()?, id).await
    }

    async fn paginate(
        &self,
        filter: &PoolFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<MessageRecord>, MurmurError> {
        queries::pool::paginate(self.db()?, filter, limit, offset).await
    }

    async fn count(&self, filter: &PoolFilter) -> Result<u64, MurmurError> {
        queries::pool::count(self.db()?, filter).await
    }
}
