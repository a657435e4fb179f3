//! Repository layer: storage contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the key-value table and user lookup contracts consumed by
//!   `ResourceStore`.
//! - Isolate SQL details from store orchestration.
//!
//! # Invariants
//! - Repositories are only constructed over migrated connections with the
//!   required tables and columns present.
//! - A failed put precondition is reported as `ConditionalCheckFailed`,
//!   never as a transport error.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::resource::ResourceKey;
use rusqlite::Connection;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod resource_table;
pub mod user_directory;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for resource and user storage operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// A conditional put found the key already present.
    ConditionalCheckFailed(ResourceKey),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(String),
    MissingRequiredColumn {
        table: String,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ConditionalCheckFailed(key) => {
                write!(f, "conditional check failed for resource {key}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is behind required {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Verifies that `table` exists on a migrated connection with `columns`.
///
/// `table` must already be a validated identifier.
pub(crate) fn ensure_table_ready(
    conn: &Connection,
    table: &str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let actual_version = current_user_version(conn)?;
    let expected_version = latest_version();
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let present = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<Result<HashSet<_>, _>>()?;

    if present.is_empty() {
        return Err(RepoError::MissingRequiredTable(table.to_string()));
    }

    if let Some(column) = columns
        .iter()
        .copied()
        .find(|column| !present.contains(*column))
    {
        return Err(RepoError::MissingRequiredColumn {
            table: table.to_string(),
            column,
        });
    }

    Ok(())
}
