//! Storage configuration injected into repository constructors.
//!
//! # Responsibility
//! - Carry the table names used by the resource and user repositories.
//! - Reject names that are unsafe to interpolate into SQL.
//!
//! # Invariants
//! - Every name held by a `StoreConfig` is a plain SQL identifier.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default table holding resource items.
pub const DEFAULT_RESOURCE_TABLE: &str = "resources";
/// Default table holding user profiles.
pub const DEFAULT_USER_TABLE: &str = "users";

static TABLE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("valid table name regex"));

/// Table names used by the SQLite repositories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    resource_table: String,
    user_table: String,
}

impl StoreConfig {
    /// Builds a config after validating both table names.
    pub fn new(
        resource_table: impl Into<String>,
        user_table: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let resource_table = validate_table_name(resource_table.into())?;
        let user_table = validate_table_name(user_table.into())?;
        Ok(Self {
            resource_table,
            user_table,
        })
    }

    pub fn resource_table(&self) -> &str {
        &self.resource_table
    }

    pub fn user_table(&self) -> &str {
        &self.user_table
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            resource_table: DEFAULT_RESOURCE_TABLE.to_string(),
            user_table: DEFAULT_USER_TABLE.to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidTableName(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTableName(value) => write!(f, "invalid table name: `{value}`"),
        }
    }
}

impl Error for ConfigError {}

fn validate_table_name(value: String) -> Result<String, ConfigError> {
    if TABLE_NAME_RE.is_match(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidTableName(value))
    }
}
