//! Admin dashboard and user management.

use serde::Serialize;
use tracing::instrument;

use hearth_core::{Role, UserId};

use crate::models::{DashboardStats, Principal};
use crate::session::SessionStore;
use crate::transport::{ApiClient, ApiError, segment};

#[derive(Serialize)]
struct RoleUpdate {
    role: Role,
}

/// `/admin/*` endpoints.
///
/// Only obtainable for an administrator session. The backend enforces the
/// same rule; this just keeps non-admin callers from issuing doomed requests.
#[derive(Debug, Clone)]
pub struct AdminApi {
    api: ApiClient,
}

impl AdminApi {
    /// Admin access for the current session, `None` unless it is an administrator.
    #[must_use]
    pub fn for_session(session: &SessionStore) -> Option<Self> {
        let principal = session.state().principal().cloned()?;
        principal.is_admin().then(|| Self {
            api: session.api().clone(),
        })
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardStats, ApiError> {
        self.api.get("/admin/dashboard").await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn users(&self) -> Result<Vec<Principal>, ApiError> {
        self.api.get("/admin/users").await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn set_role(&self, id: &UserId, role: Role) -> Result<Principal, ApiError> {
        let path = format!("/admin/users/{}/role", segment(id.as_str())?);
        self.api.put_json(&path, &RoleUpdate { role }).await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete_user(&self, id: &UserId) -> Result<(), ApiError> {
        let path = format!("/admin/users/{}", segment(id.as_str())?);
        self.api.delete(&path).await
    }
}
