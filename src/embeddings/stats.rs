use super::store::{format_timestamp, RecordType, VectorStore};
use serde::{Deserialize, Serialize};

/// Per-type counts for the three built-in record types.
/// Custom types only show up in [`StoreStats::total_vectors`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeBreakdown {
    pub issue: usize,
    pub sop: usize,
    pub log: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_vectors: usize,
    pub by_type: TypeBreakdown,
    pub oldest_entry: Option<String>,
    pub newest_entry: Option<String>,
}

impl VectorStore {
    /// Get statistics
    pub fn stats(&self) -> StoreStats {
        let inner = self.inner.read();

        let mut stats = StoreStats {
            total_vectors: inner.records.len(),
            ..StoreStats::default()
        };

        let mut oldest = None;
        let mut newest = None;
        for slot in inner.records.values() {
            let record = &slot.record;
            match record.record_type {
                RecordType::Issue => stats.by_type.issue += 1,
                RecordType::Sop => stats.by_type.sop += 1,
                RecordType::Log => stats.by_type.log += 1,
                RecordType::Other(_) => {}
            }

            if oldest.map_or(true, |ts| record.created_at < ts) {
                oldest = Some(record.created_at);
            }
            if newest.map_or(true, |ts| record.created_at > ts) {
                newest = Some(record.created_at);
            }
        }

        stats.oldest_entry = oldest.as_ref().map(format_timestamp);
        stats.newest_entry = newest.as_ref().map(format_timestamp);
        stats
    }
}
