//! Resource domain model.
//!
//! # Responsibility
//! - Derive storage names from external resource ids.
//! - Validate resource content before persistence.
//! - Convert between the domain shape and raw storage items.
//!
//! # Invariants
//! - `resource_name` is always produced by `Resource::name_from_id`.
//! - `(resource_name, user_id)` identifies one stored item.
//! - Extra fields never shadow the `resourceName`/`userId` key attributes.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Longest accepted resource name, in characters.
pub const MAX_RESOURCE_NAME_CHARS: usize = 128;

/// Item attribute holding the resource name.
pub const RESOURCE_NAME_ATTR: &str = "resourceName";
/// Item attribute holding the owning user id.
pub const USER_ID_ATTR: &str = "userId";

static RESOURCE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+(?:[-_.][a-z0-9]+)*$").expect("valid resource name regex")
});

/// Raw record shape exchanged with the key-value table.
pub type RawItem = Map<String, Value>;

/// Primary key of one stored resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub resource_name: String,
    pub user_id: String,
}

impl ResourceKey {
    pub fn new(resource_name: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            user_id: user_id.into(),
        }
    }
}

impl Display for ResourceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.user_id, self.resource_name)
    }
}

/// One user-owned resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Storage key component derived from the external id.
    pub resource_name: String,
    /// Owning user.
    pub user_id: String,
    /// Free-form attributes stored beside the key attributes.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Resource {
    /// Creates a resource from application input.
    ///
    /// An `id` that maps to no valid name leaves `resource_name` empty, which
    /// `validate()` then reports.
    pub fn new(id: &str, user_id: impl Into<String>) -> Self {
        Self {
            resource_name: Self::name_from_id(id).unwrap_or_default(),
            user_id: user_id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Adds or replaces one extra field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Maps an external id to its storage name.
    ///
    /// Returns `None` when the id cannot name a resource.
    pub fn name_from_id(id: &str) -> Option<String> {
        let name = id.trim().to_ascii_lowercase();
        if name.chars().count() > MAX_RESOURCE_NAME_CHARS || !RESOURCE_NAME_RE.is_match(&name) {
            return None;
        }
        Some(name)
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.resource_name.as_str(), self.user_id.as_str())
    }

    /// Checks content invariants required before a write.
    pub fn validate(&self) -> Result<(), ResourceValidationError> {
        if self.user_id.trim().is_empty() {
            return Err(ResourceValidationError::EmptyUserId);
        }

        if Self::name_from_id(&self.resource_name).as_deref() != Some(self.resource_name.as_str())
        {
            return Err(ResourceValidationError::InvalidResourceName(
                self.resource_name.clone(),
            ));
        }

        for name in self.fields.keys() {
            if name.trim().is_empty() {
                return Err(ResourceValidationError::EmptyFieldName);
            }
            if name == RESOURCE_NAME_ATTR || name == USER_ID_ATTR {
                return Err(ResourceValidationError::ReservedFieldName(name.clone()));
            }
        }

        Ok(())
    }

    /// Serializes into the raw storage item.
    pub fn to_item(&self) -> RawItem {
        let mut item = RawItem::new();
        for (name, value) in &self.fields {
            item.insert(name.clone(), value.clone());
        }
        item.insert(
            RESOURCE_NAME_ATTR.to_string(),
            Value::String(self.resource_name.clone()),
        );
        item.insert(USER_ID_ATTR.to_string(), Value::String(self.user_id.clone()));
        item
    }

    /// Rebuilds a resource from a raw storage item.
    pub fn from_item(item: RawItem) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(item))
    }
}

/// Content errors reported by `Resource::validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceValidationError {
    EmptyUserId,
    InvalidResourceName(String),
    EmptyFieldName,
    ReservedFieldName(String),
}

impl Display for ResourceValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUserId => write!(f, "userId must not be empty"),
            Self::InvalidResourceName(name) if name.is_empty() => {
                write!(f, "resource id does not map to a valid resource name")
            }
            Self::InvalidResourceName(name) => write!(f, "invalid resource name: `{name}`"),
            Self::EmptyFieldName => write!(f, "field names must not be empty"),
            Self::ReservedFieldName(name) => write!(f, "field name `{name}` is reserved"),
        }
    }
}

impl Error for ResourceValidationError {}

#[cfg(test)]
mod tests {
    use super::{Resource, ResourceKey, ResourceValidationError, MAX_RESOURCE_NAME_CHARS};
    use serde_json::json;

    #[test]
    fn name_from_id_trims_and_lowercases() {
        assert_eq!(
            Resource::name_from_id("  Build-Cache.V2 ").as_deref(),
            Some("build-cache.v2")
        );
        assert_eq!(Resource::name_from_id("a_b").as_deref(), Some("a_b"));
    }

    #[test]
    fn name_from_id_rejects_unnameable_ids() {
        for id in ["", "   ", "-leading", "trailing-", "a--b", "has space", "slash/name", "ünï"] {
            assert_eq!(Resource::name_from_id(id), None, "id `{id}` should not map");
        }

        let too_long = "a".repeat(MAX_RESOURCE_NAME_CHARS + 1);
        assert_eq!(Resource::name_from_id(&too_long), None);
        let longest = "a".repeat(MAX_RESOURCE_NAME_CHARS);
        assert_eq!(Resource::name_from_id(&longest), Some(longest.clone()));
    }

    #[test]
    fn new_derives_key_from_id() {
        let resource = Resource::new("Photos", "user-1");
        assert_eq!(resource.key(), ResourceKey::new("photos", "user-1"));
        assert!(resource.validate().is_ok());
    }

    #[test]
    fn validate_reports_each_content_error() {
        let err = Resource::new("photos", " ").validate().unwrap_err();
        assert_eq!(err, ResourceValidationError::EmptyUserId);

        let err = Resource::new("not valid!", "user-1").validate().unwrap_err();
        assert_eq!(err, ResourceValidationError::InvalidResourceName(String::new()));
        assert_eq!(
            err.to_string(),
            "resource id does not map to a valid resource name"
        );

        let mut tampered = Resource::new("photos", "user-1");
        tampered.resource_name = "Photos".to_string();
        assert_eq!(
            tampered.validate().unwrap_err(),
            ResourceValidationError::InvalidResourceName("Photos".to_string())
        );

        let err = Resource::new("photos", "user-1")
            .with_field("", 1)
            .validate()
            .unwrap_err();
        assert_eq!(err, ResourceValidationError::EmptyFieldName);

        let err = Resource::new("photos", "user-1")
            .with_field("userId", "someone-else")
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            ResourceValidationError::ReservedFieldName("userId".to_string())
        );
    }

    #[test]
    fn item_carries_key_attributes_beside_fields() {
        let resource = Resource::new("photos", "user-1")
            .with_field("sizeBytes", 2048)
            .with_field("tags", json!(["a", "b"]));

        let item = resource.to_item();
        assert_eq!(item["resourceName"], json!("photos"));
        assert_eq!(item["userId"], json!("user-1"));
        assert_eq!(item["sizeBytes"], json!(2048));

        let decoded = Resource::from_item(item).unwrap();
        assert_eq!(decoded, resource);
    }

    #[test]
    fn from_item_rejects_records_without_key_attributes() {
        let item = json!({ "resourceName": "photos" });
        let serde_json::Value::Object(item) = item else {
            unreachable!()
        };
        assert!(Resource::from_item(item).is_err());
    }
}
