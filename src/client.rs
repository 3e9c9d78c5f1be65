use crate::embeddings::{BatchOutcome, NewEntry, SearchFilter, SearchResult, StoreStats};
use crate::error::{RagError, Result};
use crate::server::models::{
    BatchResponse, ErrorBody, HealthResponse, RecordResponse, SearchRequest, SearchResponse,
    StoreResponse,
};
use reqwest::{Response, StatusCode, Url};

/// HTTP client for a running RAG service
pub struct RagClient {
    base_url: String,
    client: reqwest::Client,
}

impl RagClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// Insert or replace one record
    pub async fn store(&self, entry: &NewEntry) -> Result<StoreResponse> {
        let response = self
            .client
            .post(format!("{}/api/vectors", self.base_url))
            .json(entry)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// Insert many records; incomplete entries are skipped by the server
    pub async fn batch_store(&self, entries: &[NewEntry]) -> Result<BatchOutcome> {
        let response = self
            .client
            .post(format!("{}/api/vectors/batch", self.base_url))
            .json(&serde_json::json!({ "entries": entries }))
            .send()
            .await?;
        let body: BatchResponse = check(response).await?.json().await?;
        Ok(body.outcome)
    }

    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<SearchResult>> {
        let request = SearchRequest {
            query: Some(query.to_string()),
            top_k: Some(i64::try_from(top_k).unwrap_or(i64::MAX)),
            filter: Some(filter.clone()),
        };
        let response = self
            .client
            .post(format!("{}/api/vectors/search", self.base_url))
            .json(&request)
            .send()
            .await?;
        let body: SearchResponse = check(response).await?.json().await?;
        Ok(body.results)
    }

    pub async fn get(&self, id: &str) -> Result<RecordResponse> {
        let response = self.client.get(self.vector_url(id)?).send().await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let response = self.client.delete(self.vector_url(id)?).send().await?;
        check(response).await?;
        Ok(())
    }

    /// Remove every record on the server
    pub async fn clear(&self) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/api/vectors", self.base_url))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        let response = self
            .client
            .get(format!("{}/api/stats", self.base_url))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// `/api/vectors/<id>` with the id percent-encoded as one path segment
    fn vector_url(&self, id: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/api/vectors", self.base_url))
            .map_err(|e| RagError::Config(format!("Invalid service URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| RagError::Config(format!("Invalid service URL {}", self.base_url)))?
            .push(id);
        Ok(url)
    }
}

/// Turn non-2xx responses into typed errors
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);

    match status {
        StatusCode::BAD_REQUEST => Err(RagError::Validation(message)),
        StatusCode::NOT_FOUND => Err(RagError::NotFound("Vector".to_string())),
        _ => Err(RagError::Server {
            status: status.as_u16(),
            message,
        }),
    }
}
