// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message pool CRUD operations.

use murmur_core::types::{MessageRecord, PoolFilter, Scope};
use murmur_core::MurmurError;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};

use crate::database::{map_tr_err, Database};

/// Translate a filter into a WHERE clause and its bound values.
fn where_clause(filter: &PoolFilter) -> (&'static str, Vec<Value>) {
    match filter {
        PoolFilter::ForDestination(destination) => (
            "scope = ?1 OR scope = ?2",
            vec![
                Value::Text(Scope::Global.as_str().to_string()),
                Value::Text(destination.clone()),
            ],
        ),
        PoolFilter::Exact(scope) => ("scope = ?1", vec![Value::Text(scope.as_str().to_string())]),
        PoolFilter::ExactText(scope, text) => (
            "scope = ?1 AND text = ?2",
            vec![
                Value::Text(scope.as_str().to_string()),
                Value::Text(text.clone()),
            ],
        ),
        PoolFilter::Id(id) => ("id = ?1", vec![Value::Integer(*id)]),
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRecord> {
    let scope: String = row.get(2)?;
    Ok(MessageRecord {
        id: row.get(0)?,
        text: row.get(1)?,
        scope: Scope::from(scope),
    })
}

/// All records matching `filter`, oldest first.
pub async fn find(db: &Database, filter: &PoolFilter) -> Result<Vec<MessageRecord>, MurmurError> {
    let (clause, values) = where_clause(filter);
    let sql = format!("SELECT id, text, scope FROM messages WHERE {clause} ORDER BY id ASC");
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values), record_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a single record by id.
pub async fn get(db: &Database, id: i64) -> Result<Option<MessageRecord>, MurmurError> {
    Ok(find(db, &PoolFilter::Id(id)).await?.into_iter().next())
}

/// Insert a record. Returns the auto-assigned id.
pub async fn insert(db: &Database, text: &str, scope: &Scope) -> Result<i64, MurmurError> {
    let text = text.to_string();
    let scope = scope.as_str().to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (text, scope) VALUES (?1, ?2)",
                params![text, scope],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a record by id. Returns whether a row was removed.
pub async fn delete(db: &Database, id: i64) -> Result<bool, MurmurError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute("DELETE FROM messages WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// One page of matching records, highest id first.
pub async fn paginate(
    db: &Database,
    filter: &PoolFilter,
    limit: u32,
    offset: u64,
) -> Result<Vec<MessageRecord>, MurmurError> {
    let (clause, mut values) = where_clause(filter);
    let limit_idx = values.len() + 1;
    let offset_idx = values.len() + 2;
    values.push(Value::Integer(i64::from(limit)));
    values.push(Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));
    let sql = format!(
        "SELECT id, text, scope FROM messages WHERE {clause}
         ORDER BY id DESC LIMIT ?{limit_idx} OFFSET ?{offset_idx}"
    );
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values), record_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Count matching records.
pub async fn count(db: &Database, filter: &PoolFilter) -> Result<u64, MurmurError> {
    let (clause, values) = where_clause(filter);
    let sql = format!("SELECT COUNT(*) FROM messages WHERE {clause}");
    db.connection()
        .call(move |conn| {
            let n: i64 = conn.query_row(&sql, params_from_iter(values), |row| row.get(0))?;
            Ok(n.max(0) as u64)
        })
        .await
        .map_err(map_tr_err)
}
