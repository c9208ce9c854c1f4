//! HTTP transport for the Hearth backend REST API.
//!
//! [`ApiClient`] owns the `reqwest` client, the API base URL and the bearer
//! credential slot. The bearer is process-wide state shared by every clone of
//! the client: only the session store may write it (the setters are
//! crate-private), everything else reads it implicitly when requests are
//! built.
//!
//! Every request carries a fresh UUID v4 `x-request-id` header, recorded in
//! the current tracing span so client logs line up with backend logs.

mod error;

pub use error::ApiError;
use error::extract_message;

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{Span, instrument};
use url::Url;
use uuid::Uuid;

use crate::config::StorefrontConfig;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Percent-encode an identifier as one URL path segment.
///
/// `/`, `?` and `#` in the value are escaped so it cannot leave its segment.
///
/// # Errors
///
/// Returns `ApiError::InvalidPathSegment` for empty, `.` and `..` values,
/// which URL resolution would drop or turn into a parent reference.
pub fn segment(value: &str) -> Result<Cow<'_, str>, ApiError> {
    if matches!(value, "" | "." | "..") {
        return Err(ApiError::InvalidPathSegment(value.to_string()));
    }
    Ok(urlencoding::encode(value))
}

/// Client for the backend REST API.
///
/// Cheap to clone; all clones share one connection pool and one bearer slot.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    bearer: RwLock<Option<SecretString>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("bearer", &"[REDACTED]")
            .finish()
    }
}

impl ApiClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        Self::with_base_url(config.api_base_url.clone(), config.http_timeout)
    }

    /// Create a client for an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn with_base_url(mut base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hearth/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url,
                bearer: RwLock::new(None),
            }),
        })
    }

    /// The API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // =========================================================================
    // Bearer credential
    // =========================================================================

    /// Attach a bearer credential to all future requests.
    pub(crate) async fn set_bearer(&self, token: SecretString) {
        *self.inner.bearer.write().await = Some(token);
    }

    /// Detach the bearer credential.
    pub(crate) async fn clear_bearer(&self) {
        *self.inner.bearer.write().await = None;
    }

    /// The bearer credential currently attached, if any.
    pub async fn bearer(&self) -> Option<SecretString> {
        self.inner.bearer.read().await.clone()
    }

    /// Whether a bearer credential is attached.
    pub async fn has_bearer(&self) -> bool {
        self.inner.bearer.read().await.is_some()
    }

    // =========================================================================
    // Request building
    // =========================================================================

    /// Resolve an endpoint path like `/products/42` against the base URL.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidUrl` if the path cannot be joined.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(path)?;
        let request_id = Uuid::new_v4().to_string();
        Span::current().record("request_id", request_id.as_str());

        let mut builder = self
            .inner
            .client
            .request(method, url)
            .header(REQUEST_ID_HEADER, request_id);

        if let Some(token) = self.inner.bearer.read().await.as_ref() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))?;
            value.set_sensitive(true);
            builder = builder.header(AUTHORIZATION, value);
        }

        Ok(builder)
    }

    /// Send a request and decode a JSON response.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let text = self.send_raw(builder).await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request and return the raw response body on success.
    async fn send_raw(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = extract_message(&text);
            if status.is_server_error() {
                tracing::error!(status = %status, message = ?message, "API returned server error");
            } else {
                tracing::debug!(status = %status, message = ?message, "API returned client error");
            }
            return Err(ApiError::Api { status, message });
        }

        Ok(text)
    }

    // =========================================================================
    // Verbs
    // =========================================================================

    /// `GET` a JSON resource.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-success status or a body
    /// that does not decode as `T`.
    #[instrument(skip(self), fields(request_id))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, path).await?;
        self.send(builder).await
    }

    /// `GET` a JSON resource with query parameters.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    #[instrument(skip(self, query), fields(request_id))]
    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.request(Method::GET, path).await?.query(query);
        self.send(builder).await
    }

    /// Send a JSON body with the given method and decode a JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    #[instrument(skip(self, body), fields(request_id))]
    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(method, path).await?.json(body);
        self.send(builder).await
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, body).await
    }

    /// `PUT` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PUT, path, body).await
    }

    /// Send a multipart form with the given method and decode a JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    #[instrument(skip(self, form), fields(request_id))]
    pub async fn send_multipart<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: Form,
    ) -> Result<T, ApiError> {
        let builder = self.request(method, path).await?.multipart(form);
        self.send(builder).await
    }

    /// `DELETE` a resource, ignoring any response body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or non-success status.
    #[instrument(skip(self), fields(request_id))]
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, path).await?;
        self.send_raw(builder).await.map(drop)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::with_base_url(Url::parse(base).unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let api = client("https://shop.example.com/api");
        assert_eq!(api.base_url().as_str(), "https://shop.example.com/api/");
        assert_eq!(
            api.endpoint("/auth/login").unwrap().as_str(),
            "https://shop.example.com/api/auth/login"
        );
        assert_eq!(
            api.endpoint("products/42/reviews").unwrap().as_str(),
            "https://shop.example.com/api/products/42/reviews"
        );
    }

    #[test]
    fn test_segment_keeps_ids_inside_their_collection() {
        let api = client("https://shop.example.com/api");
        let path = format!("/products/{}", segment("../admin/users").unwrap());
        assert_eq!(
            api.endpoint(&path).unwrap().as_str(),
            "https://shop.example.com/api/products/..%2Fadmin%2Fusers"
        );

        let path = format!("/comments/{}", segment("c1?x=1#top").unwrap());
        let url = api.endpoint(&path).unwrap();
        assert_eq!(url.path(), "/api/comments/c1%3Fx%3D1%23top");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);

        assert_eq!(segment("65a1f0c2e4").unwrap(), "65a1f0c2e4");
    }

    #[test]
    fn test_segment_rejects_dot_segments() {
        for value in ["", ".", ".."] {
            assert!(matches!(
                segment(value),
                Err(ApiError::InvalidPathSegment(v)) if v == value
            ));
        }
    }

    #[tokio::test]
    async fn test_bearer_slot_shared_between_clones() {
        let api = client("http://localhost:5000");
        let other = api.clone();
        assert!(!other.has_bearer().await);

        api.set_bearer(SecretString::from("tok_123")).await;
        assert_eq!(
            other.bearer().await.unwrap().expose_secret(),
            "tok_123"
        );

        api.clear_bearer().await;
        assert!(!other.has_bearer().await);
    }

    #[test]
    fn test_debug_redacts_bearer() {
        let api = client("http://localhost:5000");
        let debug = format!("{api:?}");
        assert!(debug.contains("localhost:5000"));
        assert!(debug.contains("[REDACTED]"));
    }
}
