//! Key-value table contract for resource items and its SQLite backing.
//!
//! # Responsibility
//! - Store raw resource items keyed by `(resource_name, user_id)`.
//! - Express "must not already exist" writes as a put precondition.
//!
//! # Invariants
//! - `put` with `PutCondition::KeyAbsent` never overwrites an existing item.
//! - `delete` of a missing key succeeds.
//! - `scan_by_user` returns exactly the items owned by the given user.

use crate::config::StoreConfig;
use crate::model::resource::{RawItem, ResourceKey, RESOURCE_NAME_ATTR, USER_ID_ATTR};
use crate::repo::{ensure_table_ready, RepoError, RepoResult};
use log::debug;
use rusqlite::{params, Connection};
use serde_json::Value;

const REQUIRED_COLUMNS: &[&str] = &["resource_name", "user_id", "item", "updated_at"];

/// Precondition attached to a put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PutCondition {
    /// Insert or overwrite.
    #[default]
    Unconditional,
    /// Insert only; fails with `RepoError::ConditionalCheckFailed` when the
    /// key already exists.
    KeyAbsent,
}

/// Storage boundary for resource items.
pub trait ResourceTable {
    /// Returns the raw items whose `user_id` equals `user_id`, in no
    /// particular order.
    fn scan_by_user(&self, user_id: &str) -> RepoResult<Vec<RawItem>>;
    /// Writes `item` under `key`, honoring `condition`.
    fn put(&self, key: &ResourceKey, item: &RawItem, condition: PutCondition) -> RepoResult<()>;
    /// Removes the item under `key` if present.
    fn delete(&self, key: &ResourceKey) -> RepoResult<()>;
}

impl<T: ResourceTable + ?Sized> ResourceTable for &T {
    fn scan_by_user(&self, user_id: &str) -> RepoResult<Vec<RawItem>> {
        (**self).scan_by_user(user_id)
    }

    fn put(&self, key: &ResourceKey, item: &RawItem, condition: PutCondition) -> RepoResult<()> {
        (**self).put(key, item, condition)
    }

    fn delete(&self, key: &ResourceKey) -> RepoResult<()> {
        (**self).delete(key)
    }
}

/// SQLite-backed resource table.
///
/// Lookups by user go through the `user_id` index rather than a full scan.
pub struct SqliteResourceTable<'conn> {
    conn: &'conn Connection,
    table: String,
}

impl<'conn> SqliteResourceTable<'conn> {
    /// Constructs a table handle from a migrated connection.
    pub fn try_new(conn: &'conn Connection, config: &StoreConfig) -> RepoResult<Self> {
        let table = config.resource_table();
        ensure_table_ready(conn, table, REQUIRED_COLUMNS)?;
        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }
}

impl ResourceTable for SqliteResourceTable<'_> {
    fn scan_by_user(&self, user_id: &str) -> RepoResult<Vec<RawItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT resource_name, user_id, item FROM {} WHERE user_id = ?1;",
            self.table
        ))?;
        let mut rows = stmt.query([user_id])?;
        let mut items = Vec::new();

        while let Some(row) = rows.next()? {
            let key = ResourceKey::new(
                row.get::<_, String>("resource_name")?,
                row.get::<_, String>("user_id")?,
            );
            let text: String = row.get("item")?;
            items.push(parse_item(&self.table, &key, &text)?);
        }

        Ok(items)
    }

    fn put(&self, key: &ResourceKey, item: &RawItem, condition: PutCondition) -> RepoResult<()> {
        let text = serde_json::to_string(item)
            .map_err(|err| RepoError::InvalidData(format!("unserializable item {key}: {err}")))?;

        let on_conflict = match condition {
            PutCondition::Unconditional => {
                "DO UPDATE SET
                    item = excluded.item,
                    updated_at = (strftime('%s', 'now') * 1000)"
            }
            PutCondition::KeyAbsent => "DO NOTHING",
        };

        let changed = self.conn.execute(
            &format!(
                "INSERT INTO {} (resource_name, user_id, item)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (resource_name, user_id) {on_conflict};",
                self.table
            ),
            params![key.resource_name, key.user_id, text],
        )?;

        if changed == 0 {
            return Err(RepoError::ConditionalCheckFailed(key.clone()));
        }

        debug!(
            "event=resource_put module=repo status=ok table={} key={key} condition={condition:?}",
            self.table
        );
        Ok(())
    }

    fn delete(&self, key: &ResourceKey) -> RepoResult<()> {
        let removed = self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE resource_name = ?1 AND user_id = ?2;",
                self.table
            ),
            params![key.resource_name, key.user_id],
        )?;

        debug!(
            "event=resource_delete module=repo status=ok table={} key={key} removed={removed}",
            self.table
        );
        Ok(())
    }
}

fn parse_item(table: &str, key: &ResourceKey, text: &str) -> RepoResult<RawItem> {
    let item = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(item)) => item,
        Ok(_) => {
            return Err(RepoError::InvalidData(format!(
                "item for {key} in {table}.item is not a JSON object"
            )))
        }
        Err(err) => {
            return Err(RepoError::InvalidData(format!(
                "item for {key} in {table}.item is not valid JSON: {err}"
            )))
        }
    };

    // Embedded key attributes must agree with the row key.
    for (attr, expected) in [
        (RESOURCE_NAME_ATTR, key.resource_name.as_str()),
        (USER_ID_ATTR, key.user_id.as_str()),
    ] {
        if item.get(attr).and_then(Value::as_str) != Some(expected) {
            return Err(RepoError::InvalidData(format!(
                "item for {key} in {table}.item has `{attr}` that does not match its row"
            )));
        }
    }

    Ok(item)
}
