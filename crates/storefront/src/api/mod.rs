//! Typed leaf APIs over [`ApiClient`].
//!
//! Each API is a thin, cheap-to-clone wrapper issuing its own requests; there
//! is no shared cache between them. Reads return whatever the backend sends
//! now. Likes and joins return the server's updated entity, never a locally
//! adjusted count.

mod admin;
mod catalog;
mod community;
mod orders;

pub use admin::AdminApi;
pub use catalog::CatalogApi;
pub use community::CommunityApi;
pub use orders::OrdersApi;

use thiserror::Error;

use crate::transport::ApiError;
use crate::validation::FieldErrors;

/// Errors from submitting a form to the backend.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The form failed validation; nothing was sent.
    #[error("Invalid input: {0}")]
    Invalid(FieldErrors),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<reqwest::Error> for SubmitError {
    fn from(e: reqwest::Error) -> Self {
        Self::Api(ApiError::Http(e))
    }
}

impl SubmitError {
    /// Message suitable for a banner or toast.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Invalid(fields) => fields.to_string(),
            Self::Api(e) => e.user_message(fallback),
        }
    }
}

/// Fail with [`SubmitError::Invalid`] unless `errors` is empty.
fn ensure_valid(errors: FieldErrors) -> Result<(), SubmitError> {
    errors.into_result(()).map_err(SubmitError::Invalid)
}
