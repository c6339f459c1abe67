//! Cliente HTTP en proceso para los tests.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use stash_server::metrics::detached_handle;
use stash_server::{AppState, create_router_with_state};
use stash_store::stash_core::ManualClock;
use stash_store::{CacheConfig, CacheStore, DocumentStore, MemoryStore, SweepState};
use tower::ServiceExt;

/// Envia requests al router con `oneshot`, sin abrir sockets.
pub struct TestClient {
    app: Router,
}

impl TestClient {
    pub fn new(app: Router) -> Self {
        Self { app }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, &[]).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, &[]).await
    }

    pub async fn get_with_headers(&self, uri: &str, headers: Vec<(&str, &str)>) -> TestResponse {
        self.send(Method::GET, uri, &headers).await
    }

    async fn send(&self, method: Method, uri: &str, headers: &[(&str, &str)]) -> TestResponse {
        let request = headers
            .iter()
            .fold(Request::builder().method(method).uri(uri), |builder, (k, v)| {
                builder.header(*k, *v)
            })
            .body(Body::empty())
            .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Response ya leida, con helpers de assertion encadenables.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("Invalid JSON ({}): {}", e, self.text()))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(self.status, expected, "Body: {}", self.text());
        self
    }

    pub fn assert_content_type_contains(&self, expected: &str) -> &Self {
        let content_type = self.header("content-type").unwrap_or_default();
        assert!(
            content_type.contains(expected),
            "Content-Type '{}' does not contain '{}'",
            content_type,
            expected
        );
        self
    }

    pub fn assert_header_exists(&self, name: &str) -> &Self {
        assert!(self.headers.contains_key(name), "Missing header '{}'", name);
        self
    }

    pub fn assert_header(&self, name: &str, expected: &str) -> &Self {
        assert_eq!(self.header(name), Some(expected), "Header '{}'", name);
        self
    }
}

/// Cliente sobre el router sin estado (solo /health).
pub fn client() -> TestClient {
    TestClient::new(stash_server::create_router())
}

/// Router completo sobre una cache en memoria con reloj manual.
pub struct CacheFixture {
    pub client: TestClient,
    pub cache: CacheStore,
    pub clock: ManualClock,
    pub state: AppState,
}

/// Crea un fixture con el intervalo de sweep por defecto (1 hora).
pub fn cache_fixture() -> CacheFixture {
    cache_fixture_on(Arc::new(MemoryStore::new()))
}

/// Igual que [`cache_fixture`], sobre el backend dado.
pub fn cache_fixture_on(backend: Arc<dyn DocumentStore>) -> CacheFixture {
    let clock = ManualClock::default();
    let cache = CacheStore::new(backend, CacheConfig::default())
        .with_clock(Arc::new(clock.clone()));
    let state = AppState::new(
        cache.clone(),
        Arc::new(SweepState::new()),
        Duration::from_secs(3600),
    );
    let app = create_router_with_state(state.clone(), detached_handle());

    CacheFixture {
        client: TestClient::new(app),
        cache,
        clock,
        state,
    }
}
