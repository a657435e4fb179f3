//! User profile lookup consumed for quota checks.
//!
//! This crate only reads profiles; writing them belongs to whichever
//! service owns user accounts.

use crate::config::StoreConfig;
use crate::model::user::UserProfile;
use crate::repo::{ensure_table_ready, RepoResult};
use rusqlite::{Connection, OptionalExtension};

const REQUIRED_COLUMNS: &[&str] = &["user_id", "quota"];

/// Source of user profiles.
pub trait UserDirectory {
    /// Returns the profile for `user_id`, or `None` for an unknown user.
    fn get_user_by_id(&self, user_id: &str) -> RepoResult<Option<UserProfile>>;
}

impl<D: UserDirectory + ?Sized> UserDirectory for &D {
    fn get_user_by_id(&self, user_id: &str) -> RepoResult<Option<UserProfile>> {
        (**self).get_user_by_id(user_id)
    }
}

/// SQLite-backed read-only user directory.
pub struct SqliteUserDirectory<'conn> {
    conn: &'conn Connection,
    table: String,
}

impl<'conn> SqliteUserDirectory<'conn> {
    /// Constructs a directory from a migrated connection.
    pub fn try_new(conn: &'conn Connection, config: &StoreConfig) -> RepoResult<Self> {
        let table = config.user_table();
        ensure_table_ready(conn, table, REQUIRED_COLUMNS)?;
        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }
}

impl UserDirectory for SqliteUserDirectory<'_> {
    fn get_user_by_id(&self, user_id: &str) -> RepoResult<Option<UserProfile>> {
        let quota = self
            .conn
            .query_row(
                &format!("SELECT quota FROM {} WHERE user_id = ?1;", self.table),
                [user_id],
                |row| row.get::<_, i64>("quota"),
            )
            .optional()?;

        Ok(quota.map(|quota| UserProfile::new(user_id, quota)))
    }
}
