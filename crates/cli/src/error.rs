//! Unified error handling with Sentry integration.
//!
//! Every command returns `Result<T, AppError>`. `main` reports the error once
//! through [`AppError::report`], which captures backend and storage failures
//! to Sentry and logs everything else as a plain user-facing message.

use std::path::PathBuf;

use thiserror::Error;

use hearth_core::IdTokenError;
use hearth_storefront::api::SubmitError;
use hearth_storefront::cart::CheckoutError;
use hearth_storefront::config::ConfigError;
use hearth_storefront::storage::StorageError;
use hearth_storefront::transport::ApiError;
use hearth_storefront::validation::FieldErrors;

/// Application-level error type for the CLI.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{}", .0.user_message("Request failed"))]
    Api(#[from] ApiError),

    #[error("{}", .0.user_message("Request failed"))]
    Submit(#[from] SubmitError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("Invalid ID token: {0}")]
    IdToken(#[from] IdTokenError),

    /// Credential exchange was rejected.
    #[error("{message}")]
    Rejected { message: String, fields: FieldErrors },

    #[error("Could not read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not signed in. Run `hearth login` first")]
    NotAuthenticated,

    #[error("Administrator access required")]
    Forbidden,

    /// A destructive command was run without `--yes`.
    #[error("Refusing to {0} without --yes")]
    Unconfirmed(String),
}

impl AppError {
    /// Whether this is a failure on our side or the backend's, rather than
    /// something the user can fix.
    fn is_internal(&self) -> bool {
        match self {
            Self::Storage(_) => true,
            Self::Api(e)
            | Self::Submit(SubmitError::Api(e))
            | Self::Checkout(CheckoutError::Api(e)) => {
                !matches!(e, ApiError::InvalidPathSegment(_))
                    && e.status().is_none_or(|status| status.is_server_error())
            }
            _ => false,
        }
    }

    /// Log the error, capturing internal failures to Sentry.
    pub fn report(&self) {
        if self.is_internal() {
            let event_id = sentry::capture_error(self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Command failed");
        } else {
            tracing::error!("{self}");
        }

        let fields = match self {
            Self::Rejected { fields, .. }
            | Self::Submit(SubmitError::Invalid(fields))
            | Self::Checkout(CheckoutError::Invalid(fields)) => Some(fields),
            _ => None,
        };
        for (field, message) in fields.into_iter().flat_map(|f| f.iter()) {
            tracing::error!(field, "{message}");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context so captured errors are attributed.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on logout.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| scope.set_user(None));
}
