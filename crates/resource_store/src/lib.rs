//! Data-access layer for user-owned resources with per-user quotas.
//! This crate is the single source of truth for resource persistence rules.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::resource::{RawItem, Resource, ResourceKey, ResourceValidationError};
pub use model::user::UserProfile;
pub use repo::resource_table::{PutCondition, ResourceTable, SqliteResourceTable};
pub use repo::user_directory::{SqliteUserDirectory, UserDirectory};
pub use repo::{RepoError, RepoResult};
pub use service::resource_store::{ResourceStore, SaveOutcome, StoreError, StoreResult};

/// Returns the crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
