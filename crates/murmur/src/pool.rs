// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `murmur pool` command implementation.

use murmur_config::MurmurConfig;
use murmur_core::{MurmurError, PoolRepository, Scope, GLOBAL_SCOPE};
use murmur_scheduler::operations;
use murmur_storage::SqliteMessagePool;

use crate::PoolCommand;

/// Runs one pool subcommand against the configured SQLite pool.
pub async fn run_pool(config: &MurmurConfig, action: PoolCommand) -> Result<(), MurmurError> {
    let repo = SqliteMessagePool::new(config.storage.clone());
    repo.initialize().await?;

    let result = execute(&repo, config, action).await;
    repo.close().await?;
    println!("{}", result?);
    Ok(())
}

async fn execute(
    repo: &dyn PoolRepository,
    config: &MurmurConfig,
    action: PoolCommand,
) -> Result<String, MurmurError> {
    match action {
        PoolCommand::Add {
            operator,
            global,
            scope,
            text,
        } => {
            let scope = match (global, scope) {
                (true, _) => Scope::Global,
                (false, Some(id)) => Scope::parse(&id),
                (false, None) => {
                    return Err(MurmurError::InvalidInput(
                        "either --global or --scope is required".to_string(),
                    ));
                }
            };
            let outcome =
                operations::add_message(repo, &config.pool, &operator, &text, scope).await?;
            Ok(outcome.to_string())
        }
        PoolCommand::Remove { operator, id } => {
            let outcome = operations::remove_message(repo, &config.pool, &operator, id).await?;
            Ok(outcome.to_string())
        }
        PoolCommand::List { scope, page } => {
            let destination = scope.unwrap_or_else(|| GLOBAL_SCOPE.to_string());
            let listing = operations::list_page(repo, &config.pool, &destination, page).await?;
            Ok(listing.to_string())
        }
    }
}
