//! HTTP request handlers and shared application state.

use super::errors::ApiError;
use super::models::*;
use crate::config::DEFAULT_TOP_K;
use crate::embeddings::{NewEntry, VectorStore};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde_json::Value;
use std::sync::Arc;

/// Shared application state passed to every handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<VectorStore>,
}

impl AppState {
    pub fn new(store: Arc<VectorStore>) -> Self {
        Self { store }
    }
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "rag-service".to_string(),
        vectors_count: state.store.count(),
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    })
}

/// `POST /api/vectors`
pub async fn store_vector(
    State(state): State<AppState>,
    payload: Result<Json<NewEntry>, JsonRejection>,
) -> Result<Json<StoreResponse>, ApiError> {
    let Json(entry) = payload?;
    let record = state.store.store(entry)?;
    tracing::info!(id = %record.id, record_type = %record.record_type, "vector stored");

    Ok(Json(StoreResponse {
        success: true,
        stored_at: record.created_at_iso(),
        id: record.id,
    }))
}

/// `POST /api/vectors/batch`
pub async fn batch_store(
    State(state): State<AppState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchResponse>, ApiError> {
    let Json(request) = payload?;
    let items = match request.entries {
        Some(Value::Array(items)) => items,
        _ => return Err(ApiError::BadRequest("entries must be an array".to_string())),
    };

    // Entries that are not even shaped like an entry are skipped like incomplete ones.
    let entries: Vec<NewEntry> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();

    let outcome = state.store.batch_store(entries);
    tracing::info!(stored = outcome.stored_count, "batch stored");

    Ok(Json(BatchResponse {
        success: true,
        outcome,
    }))
}

/// `POST /api/vectors/search`
pub async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(request) = payload?;
    let query = request
        .query
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Query is required".to_string()))?;

    let top_k = match request.top_k {
        Some(k) => usize::try_from(k).unwrap_or(0),
        None => DEFAULT_TOP_K,
    };
    let filter = request.filter.unwrap_or_default();

    let results = state.store.search(&query, top_k, &filter)?;
    Ok(Json(SearchResponse { results }))
}

/// `GET /api/vectors/:id`
pub async fn get_vector(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecordResponse>, ApiError> {
    let record = state.store.get(&id)?;
    Ok(Json(record.into()))
}

/// `DELETE /api/vectors/:id`
pub async fn delete_vector(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.store.delete(&id)?;
    tracing::info!(id = %id, "vector deleted");
    Ok(Json(DeleteResponse { success: true, id }))
}

/// `DELETE /api/vectors`
pub async fn clear_vectors(State(state): State<AppState>) -> Json<ClearResponse> {
    state.store.clear();
    Json(ClearResponse {
        success: true,
        message: "All vectors cleared".to_string(),
    })
}

/// `GET /api/stats`
pub async fn stats(State(state): State<AppState>) -> Json<crate::embeddings::StoreStats> {
    Json(state.store.stats())
}
