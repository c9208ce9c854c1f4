//! The session store: who is logged in.
//!
//! [`SessionStore`] is the single writer of the bearer credential, both in
//! persisted storage and on the shared [`ApiClient`]. Everything else reads
//! the session through [`SessionStore::state`] or a [`watch`] subscription.
//!
//! # Lifecycle
//!
//! ```text
//! Unready ──restore()──▶ Authenticated ◀──login/register/google──┐
//!    │                        │                                   │
//!    └──────restore()──▶ Unauthenticated ◀──logout/failed check───┘
//! ```
//!
//! The store starts `Unready`. [`SessionStore::restore`] performs exactly one
//! transition out of `Unready`; no operation ever returns to it.

mod forms;

pub use forms::{MIN_PASSWORD_LEN, RegistrationForm};

use std::sync::{Arc, PoisonError};

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};
use tracing::instrument;

use hearth_core::ExternalProfile;

use crate::models::{Principal, PrincipalPatch};
use crate::storage::{Storage, StorageError, get_json, keys, set_json};
use crate::transport::{ApiClient, ApiError};
use crate::validation::FieldErrors;

const LOGIN_FALLBACK: &str = "Login failed";
const REGISTER_FALLBACK: &str = "Registration failed";
const GOOGLE_FALLBACK: &str = "Google login failed";
const NOT_READY: &str = "Session is not ready yet";
const INVALID_FIELDS: &str = "Please correct the highlighted fields";

// =============================================================================
// State
// =============================================================================

/// Observable session state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// `restore()` has not finished.
    #[default]
    Unready,
    /// Ready, with a validated principal.
    Authenticated(Principal),
    /// Ready, nobody logged in.
    Unauthenticated,
}

impl SessionState {
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        !matches!(self, Self::Unready)
    }

    #[must_use]
    pub const fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Authenticated(principal) => Some(principal),
            _ => None,
        }
    }
}

/// Result of a credential exchange.
///
/// Failures are values, not errors: the caller decides how to show them.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum AuthOutcome {
    Authenticated { principal: Principal, is_admin: bool },
    Rejected {
        /// Banner text: the backend's message or a generic fallback.
        message: String,
        /// Per-field validation errors, empty when the backend rejected the request.
        fields: FieldErrors,
    },
}

impl AuthOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
            fields: FieldErrors::new(),
        }
    }

    fn invalid(fields: FieldErrors) -> Self {
        Self::Rejected {
            message: INVALID_FIELDS.to_string(),
            fields,
        }
    }
}

// =============================================================================
// Wire shapes
// =============================================================================

/// Successful credential exchange.
#[derive(Deserialize)]
struct AuthResponse {
    #[serde(alias = "accessToken")]
    token: String,
    #[serde(alias = "principal")]
    user: Principal,
}

/// `/auth/me` answers with `{user}` or the bare principal.
#[derive(Deserialize)]
#[serde(untagged)]
enum MeResponse {
    Wrapped { user: Principal },
    Bare(Principal),
}

impl From<MeResponse> for Principal {
    fn from(response: MeResponse) -> Self {
        match response {
            MeResponse::Wrapped { user } | MeResponse::Bare(user) => user,
        }
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleLoginRequest<'a> {
    google_id: &'a str,
    email: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    picture: Option<&'a str>,
}

// =============================================================================
// SessionStore
// =============================================================================

/// Holds the authenticated principal and owns the bearer credential.
///
/// Not `Clone`: the application shell owns the store and lends it out.
/// Share it behind an `Arc` when background tasks need to observe it.
pub struct SessionStore {
    api: ApiClient,
    storage: Arc<dyn Storage>,
    state: watch::Sender<SessionState>,
    /// Snapshot adopted during `restore()` while validation is in flight.
    provisional: std::sync::RwLock<Option<Principal>>,
    /// Serialises writers so two exchanges never interleave their persistence.
    writer: Mutex<()>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create an unready store. Call [`SessionStore::restore`] next.
    #[must_use]
    pub fn new(api: ApiClient, storage: Arc<dyn Storage>) -> Self {
        Self {
            api,
            storage,
            state: watch::Sender::new(SessionState::Unready),
            provisional: std::sync::RwLock::new(None),
            writer: Mutex::new(()),
        }
    }

    /// The transport this store authenticates.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Whether `restore()` has finished.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.borrow().is_ready()
    }

    /// The current principal.
    ///
    /// While `restore()` is validating a persisted snapshot, the snapshot is
    /// returned so quick reads (name, avatar) do not flicker. Gate anything
    /// authenticated-only on [`SessionStore::wait_ready`] instead.
    #[must_use]
    pub fn principal(&self) -> Option<Principal> {
        match &*self.state.borrow() {
            SessionState::Authenticated(principal) => Some(principal.clone()),
            SessionState::Unauthenticated => None,
            SessionState::Unready => self
                .provisional
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }

    /// Whether a validated principal is logged in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(&*self.state.borrow(), SessionState::Authenticated(_))
    }

    /// Subscribe to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Wait until `restore()` has finished and return the ready state.
    pub async fn wait_ready(&self) -> SessionState {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        match rx.wait_for(SessionState::is_ready).await {
            Ok(state) => state.clone(),
            Err(_) => SessionState::Unauthenticated,
        }
    }

    // =========================================================================
    // Restore
    // =========================================================================

    /// Restore a persisted session on startup.
    ///
    /// - Token and principal snapshot: the snapshot is readable immediately,
    ///   the bearer is attached and `/auth/me` validates it. The store
    ///   becomes ready once validation finishes.
    /// - Token only: validated the same way before becoming ready.
    /// - No token: ready and unauthenticated without any network call.
    ///
    /// Validation failures of any kind clear the persisted session and end
    /// unauthenticated. Nothing is returned to the caller. Calling this again
    /// once ready is a no-op.
    #[instrument(skip(self))]
    pub async fn restore(&self) {
        let _guard = self.writer.lock().await;
        if self.is_ready() {
            return;
        }

        let Some(token) = self.read_token() else {
            // A snapshot without a token cannot be validated.
            self.remove_session_keys();
            self.transition(SessionState::Unauthenticated);
            tracing::debug!("No persisted session");
            return;
        };

        let snapshot = match get_json::<Principal>(self.storage.as_ref(), keys::PRINCIPAL) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable principal snapshot");
                None
            }
        };
        if let Some(snapshot) = snapshot {
            *self
                .provisional
                .write()
                .unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
        }

        self.api.set_bearer(token).await;

        match self.api.get::<MeResponse>("/auth/me").await {
            Ok(response) => {
                let principal = Principal::from(response);
                self.persist_principal(&principal);
                tracing::info!(user_id = %principal.id, "Session restored");
                self.transition(SessionState::Authenticated(principal));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session validation failed, signing out");
                self.clear_session().await;
                self.transition(SessionState::Unauthenticated);
            }
        }
    }

    // =========================================================================
    // Credential exchange
    // =========================================================================

    /// Exchange an email and password for a session.
    ///
    /// On rejection nothing about the existing session changes.
    #[instrument(skip(self, secret))]
    pub async fn login(&self, identifier: &str, secret: &SecretString) -> AuthOutcome {
        if !self.is_ready() {
            return AuthOutcome::rejected(NOT_READY);
        }
        let fields = forms::validate_login(identifier, secret);
        if !fields.is_empty() {
            return AuthOutcome::invalid(fields);
        }

        let _guard = self.writer.lock().await;
        let body = LoginRequest {
            email: identifier.trim(),
            password: secret.expose_secret(),
        };
        let result = self.api.post_json("/auth/login", &body).await;
        self.complete_exchange(result, LOGIN_FALLBACK).await
    }

    /// Create an account and log in.
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn register(&self, form: RegistrationForm) -> AuthOutcome {
        if !self.is_ready() {
            return AuthOutcome::rejected(NOT_READY);
        }
        let fields = form.validate();
        if !fields.is_empty() {
            return AuthOutcome::invalid(fields);
        }

        let multipart = match form.into_form() {
            Ok(multipart) => multipart,
            Err(e) => {
                tracing::warn!(error = %e, "Avatar could not be attached");
                let mut fields = FieldErrors::new();
                fields.add("avatar", "has an unsupported file type");
                return AuthOutcome::invalid(fields);
            }
        };

        let _guard = self.writer.lock().await;
        let result = self
            .api
            .send_multipart(Method::POST, "/auth/signup", multipart)
            .await;
        self.complete_exchange(result, REGISTER_FALLBACK).await
    }

    /// Exchange a federated identity for a session.
    #[instrument(skip(self, profile), fields(email = %profile.email))]
    pub async fn login_with_external_identity(&self, profile: &ExternalProfile) -> AuthOutcome {
        if !self.is_ready() {
            return AuthOutcome::rejected(NOT_READY);
        }

        let _guard = self.writer.lock().await;
        let body = GoogleLoginRequest {
            google_id: &profile.sub,
            email: &profile.email,
            name: profile.display_name(),
            picture: profile.picture.as_deref(),
        };
        let result = self.api.post_json("/auth/google", &body).await;
        self.complete_exchange(result, GOOGLE_FALLBACK).await
    }

    async fn complete_exchange(
        &self,
        result: Result<AuthResponse, ApiError>,
        fallback: &str,
    ) -> AuthOutcome {
        match result {
            Ok(AuthResponse { token, user }) => {
                let token = SecretString::from(token);
                self.persist_token(&token);
                self.persist_principal(&user);
                self.api.set_bearer(token).await;

                let is_admin = user.is_admin();
                tracing::info!(user_id = %user.id, is_admin, "Signed in");
                self.transition(SessionState::Authenticated(user.clone()));
                AuthOutcome::Authenticated {
                    principal: user,
                    is_admin,
                }
            }
            Err(e) => {
                if e.is_auth_failure() {
                    tracing::info!(error = %e, "Credentials rejected");
                } else {
                    tracing::warn!(error = %e, "Credential exchange failed");
                }
                AuthOutcome::rejected(e.user_message(fallback))
            }
        }
    }

    // =========================================================================
    // Local mutations
    // =========================================================================

    /// Merge a local edit into the principal and persist it. No network call.
    ///
    /// Returns the updated principal, or `None` when nobody is logged in.
    #[instrument(skip(self, patch))]
    pub async fn update_principal(&self, patch: PrincipalPatch) -> Option<Principal> {
        let _guard = self.writer.lock().await;
        let mut principal = self.state.borrow().principal().cloned()?;
        patch.apply(&mut principal);
        self.persist_principal(&principal);
        self.transition(SessionState::Authenticated(principal.clone()));
        Some(principal)
    }

    /// Sign out: clear persisted state, detach the bearer, become unauthenticated.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let _guard = self.writer.lock().await;
        self.clear_session().await;
        self.transition(SessionState::Unauthenticated);
        tracing::info!("Signed out");
    }

    /// Release the store, detaching the bearer from the shared transport.
    ///
    /// Persisted state is kept so the next `restore()` can pick it up.
    pub async fn dispose(self) {
        self.api.clear_bearer().await;
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn transition(&self, next: SessionState) {
        *self
            .provisional
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.state.send_replace(next);
    }

    fn read_token(&self) -> Option<SecretString> {
        match self.storage.get(keys::TOKEN) {
            Ok(token) => token
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .map(SecretString::from),
            Err(e) => {
                tracing::warn!(error = %e, "Persisted token unreadable");
                None
            }
        }
    }

    fn persist_token(&self, token: &SecretString) {
        log_storage(self.storage.set(keys::TOKEN, token.expose_secret()));
    }

    fn persist_principal(&self, principal: &Principal) {
        let storage = self.storage.as_ref();
        log_storage(set_json(storage, keys::PRINCIPAL, principal));
        log_storage(storage.set(keys::DISPLAY_NAME, &principal.name));
        log_storage(match &principal.avatar {
            Some(avatar) => storage.set(keys::AVATAR, avatar),
            None => storage.remove(keys::AVATAR),
        });
    }

    fn remove_session_keys(&self) {
        for key in keys::SESSION {
            log_storage(self.storage.remove(key));
        }
    }

    async fn clear_session(&self) {
        self.remove_session_keys();
        self.api.clear_bearer().await;
    }
}

fn log_storage(result: Result<(), StorageError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "Failed to persist session state");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use url::Url;

    use super::*;
    use crate::storage::MemoryStorage;

    fn principal_json() -> &'static str {
        r#"{"_id":"u1","name":"Ada","username":"ada","email":"ada@hearth.test","role":"admin"}"#
    }

    fn store(storage: Arc<MemoryStorage>) -> SessionStore {
        // Port 9 (discard) on loopback: any request fails fast.
        let api = ApiClient::with_base_url(
            Url::parse("http://127.0.0.1:9/api").unwrap(),
            Duration::from_millis(500),
        )
        .unwrap();
        SessionStore::new(api, storage)
    }

    #[tokio::test]
    async fn test_restore_without_token_is_unauthenticated() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::PRINCIPAL, principal_json()).unwrap();
        let session = store(Arc::clone(&storage));
        assert_eq!(session.state(), SessionState::Unready);

        session.restore().await;

        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert!(!storage.contains(keys::PRINCIPAL));
        assert!(!session.api().has_bearer().await);
    }

    #[tokio::test]
    async fn test_restore_failure_clears_everything() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::TOKEN, "tok_stale").unwrap();
        storage.set(keys::PRINCIPAL, principal_json()).unwrap();
        storage.set(keys::DISPLAY_NAME, "Ada").unwrap();
        let session = store(Arc::clone(&storage));

        session.restore().await;

        assert_eq!(session.wait_ready().await, SessionState::Unauthenticated);
        assert!(session.principal().is_none());
        for key in keys::SESSION {
            assert!(!storage.contains(key), "{key} should be cleared");
        }
        assert!(!session.api().has_bearer().await);
    }

    #[tokio::test]
    async fn test_login_before_restore_is_rejected() {
        let session = store(Arc::new(MemoryStorage::new()));
        let outcome = session
            .login("ada@hearth.test", &SecretString::from("secret"))
            .await;
        assert_eq!(
            outcome,
            AuthOutcome::Rejected {
                message: NOT_READY.to_string(),
                fields: FieldErrors::new(),
            }
        );
        assert_eq!(session.state(), SessionState::Unready);
    }

    #[tokio::test]
    async fn test_invalid_login_fields_never_reach_network() {
        let session = store(Arc::new(MemoryStorage::new()));
        session.restore().await;

        let outcome = session.login("not-an-email", &SecretString::from("")).await;
        let AuthOutcome::Rejected { message, fields } = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(message, INVALID_FIELDS);
        assert!(fields.get("email").is_some());
        assert_eq!(fields.get("password"), Some("is required"));
    }

    #[tokio::test]
    async fn test_network_failure_uses_fallback_message() {
        let storage = Arc::new(MemoryStorage::new());
        let session = store(Arc::clone(&storage));
        session.restore().await;

        let outcome = session
            .login("ada@hearth.test", &SecretString::from("secret"))
            .await;
        assert_eq!(
            outcome,
            AuthOutcome::Rejected {
                message: LOGIN_FALLBACK.to_string(),
                fields: FieldErrors::new(),
            }
        );
        assert!(!storage.contains(keys::TOKEN));
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_update_principal_requires_session() {
        let session = store(Arc::new(MemoryStorage::new()));
        session.restore().await;
        let patch = PrincipalPatch {
            name: Some("Someone".to_string()),
            ..PrincipalPatch::default()
        };
        assert!(session.update_principal(patch).await.is_none());
    }

    #[test]
    fn test_me_response_shapes() {
        let wrapped: MeResponse =
            serde_json::from_str(&format!(r#"{{"user":{}}}"#, principal_json())).unwrap();
        let bare: MeResponse = serde_json::from_str(principal_json()).unwrap();
        assert_eq!(Principal::from(wrapped), Principal::from(bare));
    }

    #[test]
    fn test_google_payload_shape() {
        let body = GoogleLoginRequest {
            google_id: "1234",
            email: "ada@hearth.test",
            name: "Ada",
            picture: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"googleId": "1234", "email": "ada@hearth.test", "name": "Ada"})
        );
    }
}
