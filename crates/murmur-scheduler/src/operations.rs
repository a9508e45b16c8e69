// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator commands over the message pool: add, remove and list.

use std::fmt;

use murmur_config::model::PoolConfig;
use murmur_core::types::{MessageRecord, PoolFilter, Scope};
use murmur_core::{MurmurError, PoolRepository};
use tracing::info;

/// Result of [`add_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added { id: i64, scope: Scope },
    /// The text already exists in that exact scope.
    Duplicate { scope: Scope },
}

impl fmt::Display for AddOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddOutcome::Added { id, scope } => write!(f, "added #{id} to {scope}"),
            AddOutcome::Duplicate { scope } if scope.is_global() => {
                write!(f, "already present in the global messages")
            }
            AddOutcome::Duplicate { scope } => write!(f, "already present in {scope}"),
        }
    }
}

/// Result of [`remove_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed(MessageRecord),
    NotFound(i64),
}

impl fmt::Display for RemoveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoveOutcome::Removed(record) => write!(
                f,
                "removed #{}\ntext: {}\nscope: {}",
                record.id, record.text, record.scope
            ),
            RemoveOutcome::NotFound(id) => write!(f, "no message with id #{id}"),
        }
    }
}

/// Distinguishes the reasons a page can come back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStatus {
    Listed,
    /// No stored messages apply to the destination at all.
    Empty,
    /// Messages exist but the requested page is past the end.
    OutOfRange,
}

/// One page of the stored messages visible to a destination.
#[derive(Debug, Clone)]
pub struct ListPage {
    pub destination: String,
    pub page: u64,
    pub total_pages: u64,
    pub total: u64,
    pub entries: Vec<MessageRecord>,
    pub status: ListStatus,
}

impl fmt::Display for ListPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            ListStatus::Empty => {
                write!(f, "no messages apply to `{}`", self.destination)
            }
            ListStatus::OutOfRange => write!(
                f,
                "page {} is empty ({} pages in total)",
                self.page, self.total_pages
            ),
            ListStatus::Listed => {
                for record in &self.entries {
                    let tag = if record.scope.is_global() { "global" } else { "local" };
                    writeln!(f, "[{tag}] #{}: {}", record.id, record.text)?;
                }
                write!(f, "page {}/{}", self.page, self.total_pages)
            }
        }
    }
}

fn ensure_admin(config: &PoolConfig, operator: &str) -> Result<(), MurmurError> {
    if config.admins.iter().any(|admin| admin == operator) {
        Ok(())
    } else {
        Err(MurmurError::PermissionDenied {
            operator: operator.to_string(),
        })
    }
}

/// Add `text` to the pool under `scope`.
///
/// Only operators listed in `pool.admins` may add. The text must not already
/// exist in the same scope; for the global scope the configured list counts
/// too.
pub async fn add_message(
    repo: &dyn PoolRepository,
    config: &PoolConfig,
    operator: &str,
    text: &str,
    scope: Scope,
) -> Result<AddOutcome, MurmurError> {
    ensure_admin(config, operator)?;
    if text.trim().is_empty() {
        return Err(MurmurError::InvalidInput(
            "message text must not be empty".to_string(),
        ));
    }

    let in_config = scope.is_global() && config.global_messages.iter().any(|m| m == text);
    if in_config
        || !repo
            .find(&PoolFilter::ExactText(scope.clone(), text.to_string()))
            .await?
            .is_empty()
    {
        return Ok(AddOutcome::Duplicate { scope });
    }

    let id = repo.insert(text, &scope).await?;
    info!(id, %scope, operator, "message added to pool");
    Ok(AddOutcome::Added { id, scope })
}

/// Delete the record with `id`, returning it for confirmation.
pub async fn remove_message(
    repo: &dyn PoolRepository,
    config: &PoolConfig,
    operator: &str,
    id: i64,
) -> Result<RemoveOutcome, MurmurError> {
    ensure_admin(config, operator)?;

    let Some(record) = repo.get(id).await? else {
        return Ok(RemoveOutcome::NotFound(id));
    };
    if !repo.delete(id).await? {
        return Ok(RemoveOutcome::NotFound(id));
    }
    info!(id, scope = %record.scope, operator, "message removed from pool");
    Ok(RemoveOutcome::Removed(record))
}

/// List stored messages visible to `destination`, newest first.
///
/// `page` is 1-based; 0 is treated as 1. The configured global list is not
/// included.
pub async fn list_page(
    repo: &dyn PoolRepository,
    config: &PoolConfig,
    destination: &str,
    page: u64,
) -> Result<ListPage, MurmurError> {
    let page = page.max(1);
    let limit = config.page_limit.max(1);
    let filter = PoolFilter::ForDestination(destination.to_string());

    let total = repo.count(&filter).await?;
    let total_pages = total.div_ceil(u64::from(limit));
    let offset = (page - 1).saturating_mul(u64::from(limit));
    let entries = repo.paginate(&filter, limit, offset).await?;

    let status = match (entries.is_empty(), total) {
        (false, _) => ListStatus::Listed,
        (true, 0) => ListStatus::Empty,
        (true, _) => ListStatus::OutOfRange,
    };

    Ok(ListPage {
        destination: destination.to_string(),
        page,
        total_pages,
        total,
        entries,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_test_utils::MemoryPool;

    fn config() -> PoolConfig {
        PoolConfig {
            admins: vec!["alice".to_string()],
            global_messages: vec!["from config".to_string()],
            page_limit: 2,
        }
    }

    fn local(id: &str) -> Scope {
        Scope::Destination(id.to_string())
    }

    #[tokio::test]
    async fn non_admin_cannot_add_or_remove() {
        let repo = MemoryPool::new();
        let err = add_message(&repo, &config(), "mallory", "hi", Scope::Global)
            .await
            .unwrap_err();
        assert!(matches!(err, MurmurError::PermissionDenied { ref operator } if operator == "mallory"));

        let id = repo.seed("keep me", Scope::Global).await;
        let err = remove_message(&repo, &config(), "mallory", id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "PermissionDenied");
        assert!(repo.get(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn empty_admin_list_denies_everyone() {
        let repo = MemoryPool::new();
        let mut cfg = config();
        cfg.admins.clear();
        assert!(add_message(&repo, &cfg, "alice", "hi", Scope::Global).await.is_err());
    }

    #[tokio::test]
    async fn blank_text_is_rejected() {
        let repo = MemoryPool::new();
        let err = add_message(&repo, &config(), "alice", "  ", Scope::Global)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidInput");
    }

    #[tokio::test]
    async fn duplicates_are_checked_per_scope() {
        let repo = MemoryPool::new();
        let cfg = config();

        let first = add_message(&repo, &cfg, "alice", "hello", local("g1")).await.unwrap();
        assert!(matches!(first, AddOutcome::Added { .. }));

        let again = add_message(&repo, &cfg, "alice", "hello", local("g1")).await.unwrap();
        assert_eq!(again, AddOutcome::Duplicate { scope: local("g1") });

        let elsewhere = add_message(&repo, &cfg, "alice", "hello", local("g2")).await.unwrap();
        assert!(matches!(elsewhere, AddOutcome::Added { .. }));

        let global = add_message(&repo, &cfg, "alice", "hello", Scope::Global).await.unwrap();
        assert!(matches!(global, AddOutcome::Added { .. }));
    }

    #[tokio::test]
    async fn configured_global_text_counts_as_duplicate() {
        let repo = MemoryPool::new();
        let outcome = add_message(&repo, &config(), "alice", "from config", Scope::Global)
            .await
            .unwrap();
        assert_eq!(outcome, AddOutcome::Duplicate { scope: Scope::Global });

        let local_ok = add_message(&repo, &config(), "alice", "from config", local("g1"))
            .await
            .unwrap();
        assert!(matches!(local_ok, AddOutcome::Added { .. }));
    }

    #[tokio::test]
    async fn remove_echoes_deleted_record() {
        let repo = MemoryPool::new();
        let id = repo.seed("bye", local("g1")).await;

        let outcome = remove_message(&repo, &config(), "alice", id).await.unwrap();
        match outcome {
            RemoveOutcome::Removed(record) => {
                assert_eq!(record.text, "bye");
                assert_eq!(record.scope, local("g1"));
            }
            other => panic!("expected Removed, got {other:?}"),
        }

        let missing = remove_message(&repo, &config(), "alice", id).await.unwrap();
        assert_eq!(missing, RemoveOutcome::NotFound(id));
    }

    #[tokio::test]
    async fn list_pages_newest_first_with_page_math() {
        let repo = MemoryPool::new();
        for text in ["a", "b", "c"] {
            repo.seed(text, Scope::Global).await;
        }
        repo.seed("other group", local("g2")).await;

        let first = list_page(&repo, &config(), "g1", 0).await.unwrap();
        assert_eq!(first.page, 1);
        assert_eq!(first.total, 3);
        assert_eq!(first.total_pages, 2);
        let texts: Vec<_> = first.entries.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["c", "b"]);

        let second = list_page(&repo, &config(), "g1", 2).await.unwrap();
        assert_eq!(second.entries.len(), 1);
        assert_eq!(second.entries[0].text, "a");
        assert!(second.to_string().ends_with("page 2/2"));
    }

    #[tokio::test]
    async fn list_distinguishes_empty_from_out_of_range() {
        let repo = MemoryPool::new();
        let empty = list_page(&repo, &config(), "g1", 1).await.unwrap();
        assert_eq!(empty.status, ListStatus::Empty);

        repo.seed("only", local("g1")).await;
        let beyond = list_page(&repo, &config(), "g1", 5).await.unwrap();
        assert_eq!(beyond.status, ListStatus::OutOfRange);
        assert!(beyond.entries.is_empty());
    }

    #[tokio::test]
    async fn listing_renders_scope_tags() {
        let repo = MemoryPool::new();
        let g = repo.seed("everyone", Scope::Global).await;
        let l = repo.seed("just us", local("g1")).await;

        let page = list_page(&repo, &config(), "g1", 1).await.unwrap();
        let rendered = page.to_string();
        assert_eq!(
            rendered,
            format!("[local] #{l}: just us\n[global] #{g}: everyone\npage 1/1")
        );
    }
}
