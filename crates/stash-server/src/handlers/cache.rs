//! Endpoints de administracion de la cache.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use stash_core::{CacheArgs, CacheKey, StoredValue, key::validate_component};
use stash_store::{CacheStats, SweepSnapshot, sweep_once};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::state::AppState;

/// Path de una operacion cacheada.
#[derive(Debug, Deserialize)]
pub struct OperationPath {
    pub namespace: String,
    pub operation: String,
}

/// Path de un namespace.
#[derive(Debug, Deserialize)]
pub struct NamespacePath {
    pub namespace: String,
}

/// Response de las operaciones de invalidacion.
#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    /// Numero de entries eliminadas.
    pub invalidated: u64,
    /// Mensaje descriptivo.
    pub message: String,
}

impl InvalidateResponse {
    fn new(invalidated: u64, scope: impl std::fmt::Display) -> Self {
        Self {
            invalidated,
            message: format!("Invalidated {} cache entries for {}", invalidated, scope),
        }
    }
}

/// Response de una entry cacheada.
#[derive(Debug, Serialize)]
pub struct EntryResponse {
    /// Fingerprint de la llamada.
    pub key: String,
    pub value: StoredValue,
}

/// Response de GET /cache/stats.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub backend: String,
    /// Documentos almacenados, incluyendo expirados. `null` si el backend falla.
    pub entries: Option<u64>,
    #[serde(flatten)]
    pub counters: CacheStats,
    pub sweep: SweepSnapshot,
}

/// Arma la key de una entry a partir del path y del query string.
fn entry_key(path: OperationPath, query: HashMap<String, String>) -> Result<CacheKey, AppError> {
    let args: CacheArgs = query.into_iter().collect();
    Ok(CacheKey::checked(path.namespace, path.operation, args)?)
}

/// GET /cache/stats
#[instrument(skip_all)]
pub async fn cache_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache();

    Json(StatsResponse {
        backend: cache.backend_name().to_string(),
        entries: cache.entry_count().await,
        counters: cache.stats(),
        sweep: state.sweep_state().snapshot(),
    })
}

/// GET /cache/{namespace}/{operation}/entry?{args}
/// Retorna el valor cacheado de una llamada, o 404 si no hay entry vigente.
/// No cuenta como hit ni miss.
#[instrument(skip_all, fields(namespace = %path.namespace, operation = %path.operation))]
pub async fn get_entry(
    State(state): State<AppState>,
    Path(path): Path<OperationPath>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<EntryResponse>, AppError> {
    let key = entry_key(path, query)?;

    match state.cache().peek(&key).await {
        Some(value) => Ok(Json(EntryResponse {
            key: key.fingerprint(),
            value,
        })),
        None => Err(AppError::NotFound {
            key: key.fingerprint(),
        }),
    }
}

/// DELETE /cache/{namespace}/{operation}/entry?{args}
/// Invalida la entry de una llamada.
#[instrument(skip_all, fields(namespace = %path.namespace, operation = %path.operation))]
pub async fn invalidate_entry(
    State(state): State<AppState>,
    Path(path): Path<OperationPath>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<InvalidateResponse>, AppError> {
    let key = entry_key(path, query)?;
    let count = state
        .cache()
        .invalidate(key.namespace(), key.operation(), key.args())
        .await;

    info!(key = %key, count, "Cache entry invalidated");
    Ok(Json(InvalidateResponse::new(count, format_args!("'{}'", key))))
}

/// DELETE /cache/{namespace}/{operation}
/// Invalida todas las entries de una operacion.
#[instrument(skip_all, fields(namespace = %path.namespace, operation = %path.operation))]
pub async fn invalidate_operation(
    State(state): State<AppState>,
    Path(path): Path<OperationPath>,
) -> Result<Json<InvalidateResponse>, AppError> {
    validate_component(&path.namespace)?;
    validate_component(&path.operation)?;

    let count = state
        .cache()
        .invalidate_operation(&path.namespace, &path.operation)
        .await;

    info!(count, "Operation entries invalidated");
    Ok(Json(InvalidateResponse::new(
        count,
        format_args!("operation '{}:{}'", path.namespace, path.operation),
    )))
}

/// DELETE /cache/{namespace}
/// Invalida todas las entries de un namespace.
#[instrument(skip_all, fields(namespace = %path.namespace))]
pub async fn invalidate_namespace(
    State(state): State<AppState>,
    Path(path): Path<NamespacePath>,
) -> Result<Json<InvalidateResponse>, AppError> {
    validate_component(&path.namespace)?;

    let count = state.cache().invalidate_namespace(&path.namespace).await;

    info!(count, "Namespace entries invalidated");
    Ok(Json(InvalidateResponse::new(
        count,
        format_args!("namespace '{}'", path.namespace),
    )))
}

/// DELETE /cache/expired
/// Ejecuta un sweep inmediato. A diferencia del resto, reporta fallas del backend.
#[instrument(skip_all)]
pub async fn sweep_expired(
    State(state): State<AppState>,
) -> Result<Json<InvalidateResponse>, AppError> {
    let removed = sweep_once(state.cache(), state.sweep_state()).await?;

    Ok(Json(InvalidateResponse::new(removed, "expired entries")))
}

/// DELETE /cache
/// Vacia la cache.
#[instrument(skip_all)]
pub async fn clear_all(State(state): State<AppState>) -> Json<InvalidateResponse> {
    let count = state.cache().clear_all().await;

    info!(count, "All cache entries invalidated");
    Json(InvalidateResponse::new(count, "all namespaces"))
}
