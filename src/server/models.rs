//! Request and response bodies of the HTTP API.

use crate::embeddings::{BatchOutcome, SearchFilter, SearchResult, VectorRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `{"error": message}` body returned on failure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub vectors_count: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreResponse {
    pub success: bool,
    pub id: String,
    pub stored_at: String,
}

/// `entries` stays untyped so a non-array can be reported and malformed
/// entries can be skipped one by one
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BatchRequest {
    pub entries: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: Option<String>,
    /// Signed so that non-positive values can be sent and answered with `[]`
    pub top_k: Option<i64>,
    pub filter: Option<SearchFilter>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

/// A stored record as returned by `GET /api/vectors/:id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordResponse {
    pub id: String,
    pub vector: Vec<f64>,
    pub content: String,
    pub metadata: Map<String, Value>,
}

impl From<VectorRecord> for RecordResponse {
    fn from(record: VectorRecord) -> Self {
        let metadata = record.metadata();
        RecordResponse {
            id: record.id,
            vector: record.vector,
            content: record.content,
            metadata,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearResponse {
    pub success: bool,
    pub message: String,
}
