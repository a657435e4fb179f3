//! Read-only user profile consumed for quota decisions.

use serde::{Deserialize, Serialize};

/// Profile fields the resource store depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    /// Maximum number of owned resources; negative means unlimited.
    pub quota: i64,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>, quota: i64) -> Self {
        Self {
            user_id: user_id.into(),
            quota,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.quota < 0
    }

    /// Returns whether a user currently owning `owned` resources may own one
    /// more.
    pub fn allows(&self, owned: usize) -> bool {
        if self.is_unlimited() {
            return true;
        }
        // quota is non-negative here
        (owned as u64) < self.quota as u64
    }
}

#[cfg(test)]
mod tests {
    use super::UserProfile;

    #[test]
    fn negative_quota_is_unlimited() {
        let profile = UserProfile::new("user-1", -1);
        assert!(profile.is_unlimited());
        assert!(profile.allows(0));
        assert!(profile.allows(10_000));
    }

    #[test]
    fn non_negative_quota_is_a_strict_upper_bound() {
        let zero = UserProfile::new("user-1", 0);
        assert!(!zero.is_unlimited());
        assert!(!zero.allows(0));

        let two = UserProfile::new("user-2", 2);
        assert!(two.allows(0));
        assert!(two.allows(1));
        assert!(!two.allows(2));
        assert!(!two.allows(3));
    }
}
