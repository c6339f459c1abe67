use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendHealth>,
}

#[derive(Debug, Serialize)]
pub struct BackendHealth {
    pub name: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "UP",
            backend: None,
        }
    }
}

/// GET /health sin estado: solo indica que el proceso responde.
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// GET /health
/// Responde 503 si el backend documental no esta disponible.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let cache = state.cache();
    let name = cache.backend_name().to_string();

    match cache.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "UP",
                backend: Some(BackendHealth {
                    name,
                    status: "UP",
                    error: None,
                }),
            }),
        ),
        Err(e) => {
            warn!(backend = %name, error = %e, "Backend health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "DOWN",
                    backend: Some(BackendHealth {
                        name,
                        status: "DOWN",
                        error: Some(e.to_string()),
                    }),
                }),
            )
        },
    }
}
