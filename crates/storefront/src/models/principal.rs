//! The authenticated principal.

use serde::{Deserialize, Serialize};

use hearth_core::{Email, Role, UserId};

/// The authenticated user held by the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Public handle.
    #[serde(default)]
    pub username: String,
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub role: Role,
    /// Set when the account was created through federated login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_google_user: Option<bool>,
}

impl Principal {
    /// Whether this principal may use the admin API.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// A local edit to the principal, e.g. after a profile form is saved.
///
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrincipalPatch {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<Email>,
    pub avatar: Option<String>,
}

impl PrincipalPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.username.is_none()
            && self.email.is_none()
            && self.avatar.is_none()
    }

    /// Merge the patch into `principal`.
    pub fn apply(self, principal: &mut Principal) {
        if let Some(name) = self.name {
            principal.name = name;
        }
        if let Some(username) = self.username {
            principal.username = username;
        }
        if let Some(email) = self.email {
            principal.email = email;
        }
        if let Some(avatar) = self.avatar {
            principal.avatar = Some(avatar);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_backend_user() {
        let json = r#"{
            "_id": "u1",
            "name": "Ada Lovelace",
            "username": "ada",
            "email": "ada@hearth.test",
            "role": "admin",
            "isGoogleUser": true,
            "createdAt": "2024-01-01T00:00:00Z"
        }"#;
        let principal: Principal = serde_json::from_str(json).unwrap();
        assert_eq!(principal.id.as_str(), "u1");
        assert!(principal.is_admin());
        assert_eq!(principal.is_google_user, Some(true));
        assert!(principal.avatar.is_none());
    }

    #[test]
    fn test_missing_role_is_ordinary_user() {
        let json = r#"{"id":"u2","name":"Grace","email":"grace@hearth.test"}"#;
        let principal: Principal = serde_json::from_str(json).unwrap();
        assert_eq!(principal.role, Role::User);
        assert_eq!(principal.username, "");
    }

    #[test]
    fn test_patch_merges_only_set_fields() {
        let mut principal: Principal =
            serde_json::from_str(r#"{"_id":"u1","name":"Ada","username":"ada","email":"ada@hearth.test"}"#)
                .unwrap();

        let patch = PrincipalPatch {
            name: Some("Ada L.".to_string()),
            avatar: Some("/uploads/ada.png".to_string()),
            ..PrincipalPatch::default()
        };
        assert!(!patch.is_empty());
        patch.apply(&mut principal);

        assert_eq!(principal.name, "Ada L.");
        assert_eq!(principal.username, "ada");
        assert_eq!(principal.avatar.as_deref(), Some("/uploads/ada.png"));
    }
}
