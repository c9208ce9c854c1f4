//! Command implementations.
//!
//! Every command runs against a [`Context`]: the stores built from
//! configuration, with the session already restored.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod community;
pub mod orders;

use std::path::Path;
use std::sync::Arc;

use hearth_storefront::api::{AdminApi, CatalogApi, CommunityApi, OrdersApi};
use hearth_storefront::cart::CartStore;
use hearth_storefront::config::StorefrontConfig;
use hearth_storefront::models::{Principal, Upload};
use hearth_storefront::session::SessionStore;
use hearth_storefront::storage::{FileStorage, Storage};
use hearth_storefront::transport::ApiClient;

use crate::error::{AppError, Result, set_sentry_user};

/// The composed application: stores plus leaf APIs.
pub struct Context {
    pub session: SessionStore,
    pub cart: CartStore,
    pub catalog: CatalogApi,
    pub orders: OrdersApi,
    pub community: CommunityApi,
}

impl Context {
    /// Build the stores and restore the persisted session.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the state directory or HTTP client cannot be set up.
    pub async fn init(config: &StorefrontConfig) -> Result<Self> {
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::open(&config.state_dir)?);
        let api = ApiClient::new(config)?;
        tracing::debug!(base_url = %api.base_url(), "Using backend");

        let session = SessionStore::new(api.clone(), Arc::clone(&storage));
        session.restore().await;
        if let Some(principal) = session.principal() {
            set_sentry_user(&principal.id, Some(principal.email.as_str()));
        }

        Ok(Self {
            session,
            cart: CartStore::load(storage),
            catalog: CatalogApi::new(api.clone()),
            orders: OrdersApi::new(api.clone()),
            community: CommunityApi::new(api),
        })
    }

    /// The logged-in principal.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotAuthenticated` if nobody is logged in.
    pub fn principal(&self) -> Result<Principal> {
        self.session
            .state()
            .principal()
            .cloned()
            .ok_or(AppError::NotAuthenticated)
    }

    /// Admin access for the current session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotAuthenticated` or `AppError::Forbidden`.
    pub fn admin(&self) -> Result<AdminApi> {
        self.principal()?;
        AdminApi::for_session(&self.session).ok_or(AppError::Forbidden)
    }

    /// Release the stores.
    pub async fn dispose(self) {
        self.session.dispose().await;
    }
}

/// Require `--yes` before a destructive request is attempted.
///
/// # Errors
///
/// Returns `AppError::Unconfirmed` when `confirmed` is false.
pub fn confirm(confirmed: bool, action: impl Into<String>) -> Result<()> {
    if confirmed {
        Ok(())
    } else {
        Err(AppError::Unconfirmed(action.into()))
    }
}

/// Read an image file for upload.
///
/// # Errors
///
/// Returns `AppError::ReadFile` if the file cannot be read.
pub async fn read_upload(path: &Path) -> Result<Upload> {
    let bytes = tokio::fs::read(path).await.map_err(|source| AppError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());
    Ok(Upload::from_bytes(file_name, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_requires_flag() {
        assert!(confirm(true, "delete post b1").is_ok());
        let err = confirm(false, "delete post b1").unwrap_err();
        assert_eq!(err.to_string(), "Refusing to delete post b1 without --yes");
    }
}
