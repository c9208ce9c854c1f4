//! Test harness for the Hearth storefront client.
//!
//! [`MockBackend`] is an in-process axum server bound to an ephemeral port.
//! Tests queue responses per `METHOD /path`, drive the real stores against
//! it, and then assert on the requests it captured.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p hearth-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, Response, StatusCode};
use axum::routing::any;
use hearth_storefront::session::SessionStore;
use hearth_storefront::storage::{MemoryStorage, Storage};
use hearth_storefront::transport::ApiClient;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, watch};
use url::Url;

/// Path prefix the mock API is mounted under.
const API_PREFIX: &str = "/api";

/// A captured request for assertions.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    /// Path relative to the API prefix, e.g. `/auth/login`.
    pub path: String,
    pub query: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    /// First value of a header, by lowercase name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The body parsed as JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    /// The body as lossy UTF-8, for multipart assertions.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A mock response to return.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl MockResponse {
    #[must_use]
    pub fn json(body: &Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "message": message }).to_string(),
            delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone, Default)]
struct MockState {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    responses: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
}

fn route_key(method: &str, path: &str) -> String {
    format!("{} {}", method.to_ascii_uppercase(), path)
}

/// Mock backend REST API.
pub struct MockBackend {
    pub addr: SocketAddr,
    state: MockState,
    shutdown: watch::Sender<bool>,
}

impl MockBackend {
    /// Start a new mock backend server.
    pub async fn start() -> Self {
        let state = MockState::default();
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let app = Router::new()
            .route("/{*path}", any(handle_request))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
                .ok();
        });

        Self {
            addr,
            state,
            shutdown: shutdown_tx,
        }
    }

    /// Queue a response for the next `method path` request.
    ///
    /// Requests with nothing queued get a 404.
    pub async fn respond(&self, method: &str, path: &str, response: MockResponse) {
        self.state
            .responses
            .lock()
            .await
            .entry(route_key(method, path))
            .or_default()
            .push_back(response);
    }

    /// All captured requests, oldest first.
    pub async fn requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().await.clone()
    }

    /// Captured requests for one route.
    pub async fn requests_to(&self, method: &str, path: &str) -> Vec<CapturedRequest> {
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.method.eq_ignore_ascii_case(method) && r.path == path)
            .collect()
    }

    /// The API base URL, including the mount prefix.
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}{API_PREFIX}/", self.addr)).unwrap()
    }

    /// A client for this backend.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        ApiClient::with_base_url(self.base_url(), Duration::from_secs(5)).unwrap()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

async fn handle_request(State(state): State<MockState>, req: Request<Body>) -> Response<Body> {
    let method = req.method().to_string();
    let full_path = req.uri().path().to_string();
    let path = full_path
        .strip_prefix(API_PREFIX)
        .unwrap_or(&full_path)
        .to_string();
    let query = req.uri().query().map(String::from);
    let headers = req
        .headers()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
        .collect();
    let body = axum::body::to_bytes(req.into_body(), 16 * 1024 * 1024)
        .await
        .unwrap_or_default()
        .to_vec();

    let key = route_key(&method, &path);
    state.requests.lock().await.push(CapturedRequest {
        method,
        path,
        query,
        headers,
        body,
    });

    let queued = state
        .responses
        .lock()
        .await
        .get_mut(&key)
        .and_then(VecDeque::pop_front);
    let response =
        queued.unwrap_or_else(|| MockResponse::error(404, &format!("No mock for {key}")));

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    Response::builder()
        .status(StatusCode::from_u16(response.status).unwrap())
        .header("content-type", "application/json")
        .body(Body::from(response.body))
        .unwrap()
}

// =============================================================================
// Fixtures
// =============================================================================

/// A principal as the backend returns it.
#[must_use]
pub fn user_json(id: &str, name: &str, role: &str) -> Value {
    json!({
        "_id": id,
        "name": name,
        "username": name.to_lowercase(),
        "email": format!("{}@hearth.test", name.to_lowercase()),
        "role": role,
        "avatar": format!("/uploads/{id}.png"),
    })
}

/// A successful credential exchange response.
#[must_use]
pub fn auth_json(token: &str, user: &Value) -> Value {
    json!({ "token": token, "user": user })
}

/// A product as the backend returns it.
#[must_use]
pub fn product_json(id: &str, title: &str, price: f64) -> Value {
    json!({
        "_id": id,
        "title": title,
        "description": format!("{title} description"),
        "price": price,
        "image": format!("/img/{id}.png"),
        "countInStock": 10,
    })
}

/// Fresh in-memory storage, typed both ways for convenience.
#[must_use]
pub fn memory_storage() -> (Arc<MemoryStorage>, Arc<dyn Storage>) {
    let storage = Arc::new(MemoryStorage::new());
    let shared: Arc<dyn Storage> = Arc::clone(&storage) as Arc<dyn Storage>;
    (storage, shared)
}

/// A restored, unauthenticated session against `backend`.
pub async fn fresh_session(backend: &MockBackend, storage: Arc<dyn Storage>) -> SessionStore {
    let session = SessionStore::new(backend.client(), storage);
    session.restore().await;
    session
}
