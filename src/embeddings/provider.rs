use crate::config::EMBEDDING_DIM;

/// Maps text to a fixed-length vector.
///
/// Implementations must be deterministic for the lifetime of the process: the
/// store compares query vectors against vectors produced earlier by the same
/// embedder.
pub trait Embedder: Send + Sync {
    /// Length of every vector returned by [`Embedder::embed`]
    fn dimension(&self) -> usize;

    fn embed(&self, text: &str) -> Vec<f64>;
}

/// Placeholder embedder derived from a rolling hash of the text.
///
/// Carries no semantic signal: related texts are not guaranteed to land close
/// together. It only guarantees shape and determinism.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashEmbedder;

impl Embedder for HashEmbedder {
    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    fn embed(&self, text: &str) -> Vec<f64> {
        let hash = i64::from(rolling_hash(text));

        let raw: Vec<f64> = (0..EMBEDDING_DIM as i64)
            .map(|i| {
                // Truncating remainder: a negative hash keeps a negative remainder.
                let value = ((hash + i) % 10_000) as f64 / 10_000.0;
                value * 2.0 - 1.0
            })
            .collect();

        normalize(raw)
    }
}

/// Embed text with the default [`HashEmbedder`]
pub fn embed(text: &str) -> Vec<f64> {
    HashEmbedder.embed(text)
}

/// `hash = hash * 31 + unit` over UTF-16 code units, wrapping at 32 bits
fn rolling_hash(text: &str) -> i32 {
    text.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_mul(31).wrapping_add(i32::from(unit))
    })
}

fn normalize(mut vector: Vec<f64>) -> Vec<f64> {
    let magnitude = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
    if magnitude == 0.0 {
        return vector;
    }
    for v in vector.iter_mut() {
        *v /= magnitude;
    }
    vector
}
