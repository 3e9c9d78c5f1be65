use super::cosine_similarity;
use super::store::{RecordType, Slot, VectorRecord, VectorStore};
use crate::config::MIN_SIMILARITY;
use crate::error::{RagError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Optional pre-filters applied before cosine scoring
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    /// Only include records whose type exactly matches
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<RecordType>,
    /// Only include records originating from this entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

impl SearchFilter {
    pub fn empty() -> Self {
        SearchFilter::default()
    }

    pub fn by_type(record_type: impl Into<RecordType>) -> Self {
        SearchFilter {
            record_type: Some(record_type.into()),
            source_id: None,
        }
    }

    pub fn by_source(source_id: impl Into<String>) -> Self {
        SearchFilter {
            record_type: None,
            source_id: Some(source_id.into()),
        }
    }

    /// Empty strings count as "no filter", matching what collaborators send
    fn matches(&self, record: &VectorRecord) -> bool {
        if let Some(ref t) = self.record_type {
            if !t.as_str().is_empty() && &record.record_type != t {
                return false;
            }
        }
        if let Some(ref source) = self.source_id {
            if !source.is_empty() && &record.source_id != source {
                return false;
            }
        }
        true
    }
}

/// One ranked search hit. The vector itself is not returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub content: String,
    pub score: f64,
    pub metadata: Map<String, Value>,
}

impl VectorStore {
    /// Embed `query` and return the `top_k` best records scoring above
    /// [`MIN_SIMILARITY`], best first.
    pub fn search(
        &self,
        query: &str,
        top_k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<SearchResult>> {
        if query.is_empty() {
            return Err(RagError::Validation("Query is required".into()));
        }

        let query_vector = self.embedder().embed(query);
        let results = self.search_vector(&query_vector, top_k, filter);
        tracing::debug!(top_k, hits = results.len(), "search complete");
        Ok(results)
    }

    /// Rank stored records against an already-embedded query
    pub fn search_vector(
        &self,
        query_vector: &[f64],
        top_k: usize,
        filter: &SearchFilter,
    ) -> Vec<SearchResult> {
        if top_k == 0 {
            return Vec::new();
        }

        let inner = self.inner.read();
        let candidates: Vec<&Slot> = inner
            .records
            .values()
            .filter(|slot| filter.matches(&slot.record))
            .collect();

        let mut scored: Vec<(f64, &Slot)> = candidates
            .par_iter()
            .map(|slot| (cosine_similarity(query_vector, &slot.record.vector), *slot))
            .filter(|(score, _)| *score > MIN_SIMILARITY)
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.seq.cmp(&b.1.seq))
        });

        scored
            .into_iter()
            .take(top_k)
            .map(|(score, slot)| SearchResult {
                id: slot.record.id.clone(),
                content: slot.record.content.clone(),
                score,
                metadata: slot.record.metadata(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EMBEDDING_DIM;
    use crate::embeddings::{embed, NewEntry};

    const QUERY: &str = "payment gateway timeout";

    /// The query vector with its first `n` components zeroed; similarity to the
    /// query falls as `n` grows but stays well above the threshold for small `n`.
    fn degraded(n: usize) -> Vec<f64> {
        let mut v = embed(QUERY);
        for x in v.iter_mut().take(n) {
            *x = 0.0;
        }
        v
    }

    fn negated() -> Vec<f64> {
        embed(QUERY).into_iter().map(|x| -x).collect()
    }

    /// Unit vector along one axis; against the query it scores a single
    /// component of a 384-dimension unit vector, far below the threshold
    fn axis(i: usize) -> Vec<f64> {
        let mut v = vec![0.0; EMBEDDING_DIM];
        v[i] = 1.0;
        v
    }

    fn add(store: &VectorStore, id: &str, record_type: &str, source: &str, vector: Vec<f64>) {
        store
            .store(NewEntry::new(id, format!("content {}", id), record_type, source).with_vector(vector))
            .unwrap();
    }

    #[test]
    fn test_search_empty_store_returns_nothing() {
        let store = VectorStore::new();
        let results = store.search(QUERY, 5, &SearchFilter::empty()).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_search_rejects_empty_query() {
        let store = VectorStore::new();
        assert!(matches!(
            store.search("", 5, &SearchFilter::empty()),
            Err(RagError::Validation(_))
        ));
    }

    #[test]
    fn test_search_finds_exact_content_match() {
        let store = VectorStore::new();
        store
            .store(NewEntry::new("a", QUERY, "issue", "1"))
            .unwrap();
        let results = store.search(QUERY, 5, &SearchFilter::empty()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "a");
        assert_eq!(results[0].content, QUERY);
        assert!((results[0].score - 1.0).abs() < 1e-9);
        assert_eq!(results[0].metadata.get("type"), Some(&Value::from("issue")));
    }

    #[test]
    fn test_search_excludes_low_scores() {
        let store = VectorStore::new();
        add(&store, "opposite", "issue", "1", negated());
        add(&store, "axis", "issue", "1", axis(7));
        add(&store, "close", "issue", "1", degraded(0));

        let results = store.search(QUERY, 10, &SearchFilter::empty()).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["close"]);
        assert!(results.iter().all(|r| r.score > MIN_SIMILARITY));
    }

    #[test]
    fn test_search_excludes_score_at_threshold() {
        let store = VectorStore::new();
        // |v| = sqrt(9 + 81 + 9 + 1) = 10, so cos(e0, v) = 3 / 10
        let mut v = vec![0.0; EMBEDDING_DIM];
        v[..4].copy_from_slice(&[3.0, 9.0, 3.0, 1.0]);
        assert_eq!(cosine_similarity(&axis(0), &v), MIN_SIMILARITY);
        add(&store, "edge", "issue", "1", v);

        let results = store.search_vector(&axis(0), 10, &SearchFilter::empty());
        assert!(results.is_empty());
    }

    #[test]
    fn test_search_excludes_dimension_mismatch() {
        let store = VectorStore::new();
        add(&store, "a", "issue", "1", degraded(0));
        let results = store.search_vector(&[1.0, 0.0], 5, &SearchFilter::empty());
        assert!(results.is_empty());
    }

    #[test]
    fn test_search_truncates_to_top_k_sorted() {
        let store = VectorStore::new();
        for n in 0..10 {
            add(&store, &format!("r{}", n), "issue", "1", degraded(n));
        }

        let results = store.search(QUERY, 3, &SearchFilter::empty()).unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(results[0].id, "r0");
    }

    #[test]
    fn test_search_default_and_unbounded_top_k() {
        let store = VectorStore::new();
        for n in 0..10 {
            add(&store, &format!("r{}", n), "issue", "1", degraded(n));
        }
        let results = store.search(QUERY, 100, &SearchFilter::empty()).unwrap();
        assert_eq!(results.len(), 10);
    }

    #[test]
    fn test_search_zero_top_k_is_empty() {
        let store = VectorStore::new();
        add(&store, "a", "issue", "1", degraded(0));
        assert!(store.search(QUERY, 0, &SearchFilter::empty()).unwrap().is_empty());
    }

    #[test]
    fn test_search_filters_by_type() {
        let store = VectorStore::new();
        add(&store, "issue-best", "issue", "1", degraded(0));
        add(&store, "log-best", "log", "1", degraded(1));
        add(&store, "sop-a", "sop", "2", degraded(5));
        add(&store, "sop-b", "sop", "3", degraded(6));

        let results = store.search(QUERY, 10, &SearchFilter::by_type("sop")).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["sop-a", "sop-b"]);
    }

    #[test]
    fn test_search_filters_by_source_and_type() {
        let store = VectorStore::new();
        add(&store, "a", "issue", "42", degraded(0));
        add(&store, "b", "sop", "42", degraded(0));
        add(&store, "c", "issue", "7", degraded(0));

        let filter = SearchFilter {
            record_type: Some(RecordType::Issue),
            source_id: Some("42".into()),
        };
        let results = store.search(QUERY, 10, &filter).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "a");

        let by_source = store.search(QUERY, 10, &SearchFilter::by_source("42")).unwrap();
        assert_eq!(by_source.len(), 2);
    }

    #[test]
    fn test_empty_filter_fields_are_ignored() {
        let store = VectorStore::new();
        add(&store, "a", "issue", "1", degraded(0));
        let filter = SearchFilter {
            record_type: Some(RecordType::from("")),
            source_id: Some(String::new()),
        };
        assert_eq!(store.search(QUERY, 5, &filter).unwrap().len(), 1);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let store = VectorStore::new();
        for id in ["first", "second", "third"] {
            add(&store, id, "issue", "1", degraded(0));
        }
        let results = store.search(QUERY, 3, &SearchFilter::empty()).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_filter_deserializes_from_wire_shape() {
        let filter: SearchFilter =
            serde_json::from_value(serde_json::json!({ "type": "sop", "sourceId": "9" })).unwrap();
        assert_eq!(filter.record_type, Some(RecordType::Sop));
        assert_eq!(filter.source_id.as_deref(), Some("9"));

        let empty: SearchFilter = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(empty, SearchFilter::empty());
    }
}
