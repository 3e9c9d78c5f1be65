use super::provider::{Embedder, HashEmbedder};
use crate::error::{RagError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Metadata keys owned by the store; caller metadata cannot override them
pub const RESERVED_METADATA_KEYS: [&str; 4] = ["id", "type", "sourceId", "createdAt"];

/// Kind of content a record was built from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordType {
    Issue,
    Sop,
    Log,
    Other(String),
}

impl RecordType {
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::Issue => "issue",
            RecordType::Sop => "sop",
            RecordType::Log => "log",
            RecordType::Other(s) => s,
        }
    }
}

impl From<String> for RecordType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "issue" => RecordType::Issue,
            "sop" => RecordType::Sop,
            "log" => RecordType::Log,
            _ => RecordType::Other(s),
        }
    }
}

impl From<&str> for RecordType {
    fn from(s: &str) -> Self {
        RecordType::from(s.to_string())
    }
}

impl From<RecordType> for String {
    fn from(t: RecordType) -> Self {
        match t {
            RecordType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::str::FromStr for RecordType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(RecordType::from(s))
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An insert request as submitted by a collaborator.
///
/// Every field is optional on the wire so that batch inserts can skip
/// incomplete entries instead of rejecting the whole payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    pub id: Option<String>,
    pub content: Option<String>,
    /// Missing or empty vectors are computed from `content`
    pub vector: Option<Vec<f64>>,
    #[serde(rename = "type")]
    pub record_type: Option<RecordType>,
    pub source_id: Option<String>,
    pub metadata: Option<Map<String, Value>>,
}

impl NewEntry {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        record_type: impl Into<RecordType>,
        source_id: impl Into<String>,
    ) -> Self {
        NewEntry {
            id: Some(id.into()),
            content: Some(content.into()),
            vector: None,
            record_type: Some(record_type.into()),
            source_id: Some(source_id.into()),
            metadata: None,
        }
    }

    pub fn with_vector(mut self, vector: Vec<f64>) -> Self {
        self.vector = Some(vector);
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// One stored record
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f64>,
    pub content: String,
    pub record_type: RecordType,
    pub source_id: String,
    pub created_at: DateTime<Utc>,
    /// Caller-supplied metadata, reserved keys already removed
    pub extra: Map<String, Value>,
}

impl VectorRecord {
    /// `createdAt` in the ISO-8601 form used on the wire
    pub fn created_at_iso(&self) -> String {
        format_timestamp(&self.created_at)
    }

    /// Caller metadata merged with the store-owned keys
    pub fn metadata(&self) -> Map<String, Value> {
        let mut merged = Map::with_capacity(self.extra.len() + 3);
        merged.insert(
            "type".to_string(),
            Value::String(self.record_type.as_str().to_string()),
        );
        merged.insert("sourceId".to_string(), Value::String(self.source_id.clone()));
        merged.insert("createdAt".to_string(), Value::String(self.created_at_iso()));
        for (key, value) in &self.extra {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Result of a lenient batch insert
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub stored_count: usize,
    pub ids: Vec<String>,
}

pub(crate) struct Slot {
    /// Insertion sequence; breaks score ties in search
    pub seq: u64,
    pub record: VectorRecord,
}

#[derive(Default)]
pub(crate) struct Inner {
    pub records: HashMap<String, Slot>,
    next_seq: u64,
    last_created: Option<DateTime<Utc>>,
}

impl Inner {
    /// Wall-clock now, clamped so timestamps never run backwards
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_created {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_created = Some(ts);
        ts
    }

    fn insert(&mut self, prepared: Prepared) -> VectorRecord {
        let created_at = self.next_timestamp();
        let seq = self.next_seq;
        self.next_seq += 1;

        let record = VectorRecord {
            id: prepared.id,
            vector: prepared.vector,
            content: prepared.content,
            record_type: prepared.record_type,
            source_id: prepared.source_id,
            created_at,
            extra: prepared.extra,
        };

        // Replacement drops the old record wholesale, metadata included.
        self.records.insert(
            record.id.clone(),
            Slot {
                seq,
                record: record.clone(),
            },
        );
        record
    }
}

/// A validated entry, ready to be inserted
struct Prepared {
    id: String,
    vector: Vec<f64>,
    content: String,
    record_type: RecordType,
    source_id: String,
    extra: Map<String, Value>,
}

/// In-memory vector store keyed by record id.
///
/// Mutations hold the write lock for their whole duration, so readers either
/// see a mutation completely or not at all.
pub struct VectorStore {
    pub(crate) inner: RwLock<Inner>,
    embedder: Box<dyn Embedder>,
}

impl Default for VectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorStore {
    /// Create an empty store backed by the placeholder [`HashEmbedder`]
    pub fn new() -> Self {
        Self::with_embedder(Box::new(HashEmbedder))
    }

    pub fn with_embedder(embedder: Box<dyn Embedder>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            embedder,
        }
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Insert or replace a single record
    pub fn store(&self, entry: NewEntry) -> Result<VectorRecord> {
        let prepared = self.prepare(entry)?;
        let record = self.inner.write().insert(prepared);
        tracing::debug!(id = %record.id, record_type = %record.record_type, "stored vector");
        Ok(record)
    }

    /// Insert many records; invalid entries are skipped without error
    pub fn batch_store(&self, entries: Vec<NewEntry>) -> BatchOutcome {
        let total = entries.len();
        let prepared: Vec<Prepared> = entries
            .into_iter()
            .filter_map(|entry| self.prepare(entry).ok())
            .collect();

        let mut ids = Vec::with_capacity(prepared.len());
        {
            let mut inner = self.inner.write();
            for p in prepared {
                ids.push(inner.insert(p).id);
            }
        }

        if ids.len() < total {
            tracing::debug!(
                stored = ids.len(),
                skipped = total - ids.len(),
                "batch store skipped incomplete entries"
            );
        }

        BatchOutcome {
            stored_count: ids.len(),
            ids,
        }
    }

    pub fn get(&self, id: &str) -> Result<VectorRecord> {
        self.inner
            .read()
            .records
            .get(id)
            .map(|slot| slot.record.clone())
            .ok_or_else(|| RagError::NotFound(format!("Vector {}", id)))
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        match self.inner.write().records.remove(id) {
            Some(_) => {
                tracing::debug!(id, "deleted vector");
                Ok(())
            }
            None => Err(RagError::NotFound(format!("Vector {}", id))),
        }
    }

    /// Remove every record. Irreversible.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        let removed = inner.records.len();
        inner.records.clear();
        tracing::info!(removed, "cleared vector store");
    }

    pub fn count(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Validate an entry and resolve its vector. Runs outside the lock.
    fn prepare(&self, entry: NewEntry) -> Result<Prepared> {
        let id = required(entry.id, "id")?;
        let content = required(entry.content, "content")?;
        let source_id = required(entry.source_id, "sourceId")?;
        let record_type = entry
            .record_type
            .filter(|t| !t.as_str().is_empty())
            .ok_or_else(|| RagError::Validation("Missing required field: type".into()))?;

        let vector = match entry.vector {
            Some(v) if !v.is_empty() => v,
            _ => self.embedder.embed(&content),
        };
        if vector.len() != self.dimension() {
            return Err(RagError::Validation(format!(
                "Vector dimension mismatch: expected {}, got {}",
                self.dimension(),
                vector.len()
            )));
        }

        let mut extra = entry.metadata.unwrap_or_default();
        extra.retain(|key, _| {
            let reserved = RESERVED_METADATA_KEYS.contains(&key.as_str());
            if reserved {
                tracing::debug!(id = %id, key = %key, "ignoring reserved metadata key");
            }
            !reserved
        });

        Ok(Prepared {
            id,
            vector,
            content,
            record_type,
            source_id,
            extra,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| RagError::Validation(format!("Missing required field: {}", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EMBEDDING_DIM;
    use serde_json::json;

    fn entry(id: &str, content: &str) -> NewEntry {
        NewEntry::new(id, content, RecordType::Issue, "issue-1")
    }

    #[test]
    fn test_store_computes_missing_vector() {
        let store = VectorStore::new();
        let record = store.store(entry("a", "disk full")).unwrap();
        assert_eq!(record.vector.len(), EMBEDDING_DIM);
        assert_eq!(record.vector, crate::embeddings::embed("disk full"));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_store_treats_empty_vector_as_missing() {
        let store = VectorStore::new();
        let record = store.store(entry("a", "disk full").with_vector(vec![])).unwrap();
        assert_eq!(record.vector.len(), EMBEDDING_DIM);
    }

    #[test]
    fn test_store_keeps_supplied_vector() {
        let store = VectorStore::new();
        let v = vec![0.5; EMBEDDING_DIM];
        let record = store.store(entry("a", "x").with_vector(v.clone())).unwrap();
        assert_eq!(record.vector, v);
    }

    #[test]
    fn test_store_rejects_wrong_dimension() {
        let store = VectorStore::new();
        let err = store
            .store(entry("a", "x").with_vector(vec![1.0, 2.0]))
            .unwrap_err();
        assert!(matches!(err, RagError::Validation(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_requires_fields() {
        let store = VectorStore::new();
        let cases = [
            NewEntry {
                id: None,
                ..entry("a", "x")
            },
            NewEntry {
                content: Some(String::new()),
                ..entry("a", "x")
            },
            NewEntry {
                record_type: None,
                ..entry("a", "x")
            },
            NewEntry {
                source_id: None,
                ..entry("a", "x")
            },
        ];
        for case in cases {
            assert!(matches!(store.store(case), Err(RagError::Validation(_))));
        }
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_store_same_id_replaces_record() {
        let store = VectorStore::new();
        let mut first_meta = Map::new();
        first_meta.insert("category".into(), json!("network"));
        store
            .store(entry("a", "first").with_metadata(first_meta))
            .unwrap();

        let mut second_meta = Map::new();
        second_meta.insert("severity".into(), json!("high"));
        store
            .store(entry("a", "second").with_metadata(second_meta))
            .unwrap();

        assert_eq!(store.count(), 1);
        let record = store.get("a").unwrap();
        assert_eq!(record.content, "second");
        let meta = record.metadata();
        assert_eq!(meta.get("severity"), Some(&json!("high")));
        assert!(meta.get("category").is_none());
    }

    #[test]
    fn test_reserved_metadata_keys_are_not_overridden() {
        let store = VectorStore::new();
        let mut meta = Map::new();
        meta.insert("type".into(), json!("log"));
        meta.insert("sourceId".into(), json!("spoofed"));
        meta.insert("createdAt".into(), json!("1970-01-01T00:00:00.000Z"));
        meta.insert("version".into(), json!(2));

        let record = store.store(entry("a", "x").with_metadata(meta)).unwrap();
        let merged = record.metadata();
        assert_eq!(merged.get("type"), Some(&json!("issue")));
        assert_eq!(merged.get("sourceId"), Some(&json!("issue-1")));
        assert_eq!(
            merged.get("createdAt"),
            Some(&json!(record.created_at_iso()))
        );
        assert_eq!(merged.get("version"), Some(&json!(2)));
    }

    #[test]
    fn test_metadata_keeps_store_keys_first() {
        let store = VectorStore::new();
        let mut meta = Map::new();
        meta.insert("zone".into(), json!("eu"));
        meta.insert("type".into(), json!("log"));
        meta.insert("alpha".into(), json!(1));

        let record = store.store(entry("a", "x").with_metadata(meta)).unwrap();
        let keys: Vec<String> = record.metadata().keys().cloned().collect();
        assert_eq!(keys, vec!["type", "sourceId", "createdAt", "zone", "alpha"]);

        let wire = serde_json::to_string(&record.metadata()).unwrap();
        assert!(wire.starts_with(r#"{"type":"issue","sourceId":"issue-1","createdAt":"#));
    }

    #[test]
    fn test_created_at_is_monotonic() {
        let store = VectorStore::new();
        let mut previous = None;
        for i in 0..50 {
            let record = store.store(entry(&format!("r{}", i), "x")).unwrap();
            if let Some(prev) = previous {
                assert!(record.created_at >= prev);
            }
            previous = Some(record.created_at);
        }
    }

    #[test]
    fn test_created_at_iso_format() {
        let store = VectorStore::new();
        let record = store.store(entry("a", "x")).unwrap();
        let iso = record.created_at_iso();
        assert!(iso.ends_with('Z'));
        assert_eq!(iso.len(), "2024-01-01T00:00:00.000Z".len());
    }

    #[test]
    fn test_batch_store_skips_incomplete_entries() {
        let store = VectorStore::new();
        let outcome = store.batch_store(vec![entry("a", "valid"), NewEntry::default()]);
        assert_eq!(outcome.stored_count, 1);
        assert_eq!(outcome.ids, vec!["a".to_string()]);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_batch_store_replaces_within_batch() {
        let store = VectorStore::new();
        let outcome = store.batch_store(vec![entry("a", "one"), entry("a", "two")]);
        assert_eq!(outcome.ids, vec!["a".to_string(), "a".to_string()]);
        assert_eq!(store.count(), 1);
        assert_eq!(store.get("a").unwrap().content, "two");
    }

    #[test]
    fn test_get_and_delete_unknown_id() {
        let store = VectorStore::new();
        assert!(matches!(store.get("nope"), Err(RagError::NotFound(_))));
        assert!(matches!(store.delete("nope"), Err(RagError::NotFound(_))));
    }

    #[test]
    fn test_delete_then_get() {
        let store = VectorStore::new();
        store.store(entry("a", "x")).unwrap();
        store.delete("a").unwrap();
        assert!(matches!(store.get("a"), Err(RagError::NotFound(_))));
        assert!(matches!(store.delete("a"), Err(RagError::NotFound(_))));
    }

    #[test]
    fn test_clear_empties_store() {
        let store = VectorStore::new();
        store.batch_store(vec![entry("a", "x"), entry("b", "y")]);
        assert_eq!(store.count(), 2);
        store.clear();
        assert_eq!(store.count(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_record_type_round_trips_custom_tags() {
        assert_eq!(RecordType::from("sop"), RecordType::Sop);
        assert_eq!(
            RecordType::from("runbook"),
            RecordType::Other("runbook".into())
        );
        assert_eq!(String::from(RecordType::Other("runbook".into())), "runbook");
        let parsed: RecordType = serde_json::from_value(json!("log")).unwrap();
        assert_eq!(parsed, RecordType::Log);
        assert_eq!(serde_json::to_value(RecordType::Issue).unwrap(), json!("issue"));
    }

    #[test]
    fn test_new_entry_deserializes_camel_case() {
        let entry: NewEntry = serde_json::from_value(json!({
            "id": "sop-1",
            "content": "Restart the service",
            "vector": [],
            "type": "sop",
            "sourceId": "1",
            "metadata": { "category": "ops" }
        }))
        .unwrap();
        assert_eq!(entry.record_type, Some(RecordType::Sop));
        assert_eq!(entry.source_id.as_deref(), Some("1"));
        assert_eq!(entry.vector, Some(vec![]));
    }

    #[test]
    fn test_concurrent_writers_and_readers() {
        let store = std::sync::Arc::new(VectorStore::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store.store(entry(&format!("{}-{}", t, i), "x")).unwrap();
                        let _ = store.count();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.count(), 100);
    }

    #[test]
    fn test_readers_never_see_partial_batch_or_clear() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::{Arc, Barrier};

        const N: usize = 200;
        let store = Arc::new(VectorStore::new());
        let done = Arc::new(AtomicBool::new(false));
        let barrier = Arc::new(Barrier::new(3));

        let writer = {
            let (store, done, barrier) = (store.clone(), done.clone(), barrier.clone());
            std::thread::spawn(move || {
                let batch: Vec<NewEntry> = (0..N)
                    .map(|i| entry(&format!("b{}", i), "x").with_vector(vec![1.0; EMBEDDING_DIM]))
                    .collect();
                barrier.wait();
                for _ in 0..20 {
                    assert_eq!(store.batch_store(batch.clone()).stored_count, N);
                    store.clear();
                }
                done.store(true, Ordering::SeqCst);
            })
        };

        let readers: Vec<_> = (0..2)
            .map(|r| {
                let (store, done, barrier) = (store.clone(), done.clone(), barrier.clone());
                std::thread::spawn(move || {
                    let mut observed = Vec::new();
                    barrier.wait();
                    while !done.load(Ordering::SeqCst) {
                        let seen = if r == 0 {
                            store.count()
                        } else {
                            store.stats().total_vectors
                        };
                        observed.push(seen);
                    }
                    observed
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            let observed = reader.join().unwrap();
            assert!(
                observed.iter().all(|&n| n == 0 || n == N),
                "partial state observed: {:?}",
                observed.iter().find(|&&n| n != 0 && n != N)
            );
        }
        assert_eq!(store.count(), 0);
    }
}
