//! Resource use-case service.
//!
//! # Responsibility
//! - List, quota-check, save and delete resources for a user.
//! - Separate expected business outcomes from storage failures.
//!
//! # Invariants
//! - Invalid resources never reach storage.
//! - A new-resource save never overwrites an existing item.
//! - Storage failures are logged once here and returned, never swallowed.
//! - `check_quota` and `save_resource` are independent calls; nothing ties a
//!   passed check to the following write.

use crate::model::resource::{Resource, ResourceKey, ResourceValidationError};
use crate::repo::resource_table::{PutCondition, ResourceTable};
use crate::repo::user_directory::UserDirectory;
use crate::repo::RepoError;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result message for a new-resource save whose key is taken.
pub const ALREADY_EXISTS_MESSAGE: &str = "Resource already exists";

pub type StoreResult<T> = Result<T, StoreError>;

/// Unexpected failure of a store operation.
#[derive(Debug)]
pub enum StoreError {
    UserNotFound(String),
    Repo(RepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserNotFound(user_id) => write!(f, "user not found: {user_id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UserNotFound(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Completed save, successful or rejected for a business reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Invalid(ResourceValidationError),
    AlreadyExists,
}

impl SaveOutcome {
    pub fn success(&self) -> bool {
        matches!(self, Self::Saved)
    }

    /// Human-readable rejection reason; `None` on success.
    pub fn result(&self) -> Option<String> {
        match self {
            Self::Saved => None,
            Self::Invalid(err) => Some(err.to_string()),
            Self::AlreadyExists => Some(ALREADY_EXISTS_MESSAGE.to_string()),
        }
    }
}

/// Data-access entry point for user-owned resources.
pub struct ResourceStore<T: ResourceTable, U: UserDirectory> {
    table: T,
    users: U,
}

impl<T: ResourceTable, U: UserDirectory> ResourceStore<T, U> {
    pub fn new(table: T, users: U) -> Self {
        Self { table, users }
    }

    /// Lists every resource owned by `user_id`, in no particular order.
    pub fn get_user_resources(&self, user_id: &str) -> StoreResult<Vec<Resource>> {
        let items = self.table.scan_by_user(user_id).map_err(|err| {
            error!("event=resource_list module=store status=error user_id={user_id} error={err}");
            err
        })?;

        items
            .into_iter()
            .map(|item| {
                Resource::from_item(item).map_err(|err| {
                    error!(
                        "event=resource_list module=store status=error user_id={user_id} error_code=undecodable_item error={err}"
                    );
                    StoreError::Repo(RepoError::InvalidData(format!(
                        "undecodable resource item for user `{user_id}`: {err}"
                    )))
                })
            })
            .collect()
    }

    /// Returns whether `user_id` owns fewer resources than their quota.
    ///
    /// Unlimited users short-circuit without counting.
    pub fn check_quota(&self, user_id: &str) -> StoreResult<bool> {
        let profile = match self.users.get_user_by_id(user_id) {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                warn!("event=quota_check module=store status=error user_id={user_id} error_code=user_not_found");
                return Err(StoreError::UserNotFound(user_id.to_string()));
            }
            Err(err) => {
                error!("event=quota_check module=store status=error user_id={user_id} error={err}");
                return Err(err.into());
            }
        };

        if profile.is_unlimited() {
            return Ok(true);
        }

        let owned = self.get_user_resources(user_id)?.len();
        Ok(profile.allows(owned))
    }

    /// Validates and writes `resource`.
    ///
    /// With `is_new`, the write only succeeds when the key is free;
    /// otherwise an existing item is overwritten.
    pub fn save_resource(&self, resource: &Resource, is_new: bool) -> StoreResult<SaveOutcome> {
        // TODO: gate new resources on check_quota once the admission rule
        // for concurrent saves is decided; today quota is not consulted here.
        if let Err(err) = resource.validate() {
            return Ok(SaveOutcome::Invalid(err));
        }

        let key = resource.key();
        let condition = if is_new {
            PutCondition::KeyAbsent
        } else {
            PutCondition::Unconditional
        };

        match self.table.put(&key, &resource.to_item(), condition) {
            Ok(()) => {
                info!("event=resource_save module=store status=ok key={key} is_new={is_new}");
                Ok(SaveOutcome::Saved)
            }
            Err(RepoError::ConditionalCheckFailed(_)) => Ok(SaveOutcome::AlreadyExists),
            Err(err) => {
                error!("event=resource_save module=store status=error key={key} is_new={is_new} error={err}");
                Err(err.into())
            }
        }
    }

    /// Deletes the resource `id` owned by `user_id`.
    ///
    /// An `id` that names no resource, or a key that is not stored, is a
    /// successful no-op.
    pub fn delete_resource(&self, user_id: &str, id: &str) -> StoreResult<()> {
        let Some(resource_name) = Resource::name_from_id(id) else {
            return Ok(());
        };

        let key = ResourceKey::new(resource_name, user_id);
        self.table.delete(&key).map_err(|err| {
            error!("event=resource_delete module=store status=error key={key} error={err}");
            StoreError::from(err)
        })?;

        info!("event=resource_delete module=store status=ok key={key}");
        Ok(())
    }
}
