pub mod provider;
pub mod search;
pub mod stats;
pub mod store;

pub use provider::{embed, Embedder, HashEmbedder};
pub use search::{SearchFilter, SearchResult};
pub use stats::{StoreStats, TypeBreakdown};
pub use store::{BatchOutcome, NewEntry, RecordType, VectorRecord, VectorStore};

pub use crate::config::EMBEDDING_DIM;

/// Cosine similarity between two vectors.
///
/// Vectors of different length, or with a zero norm, score 0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let magnitude_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    let denominator = magnitude_a * magnitude_b;
    if denominator == 0.0 {
        return 0.0;
    }

    dot_product / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_is_symmetric() {
        let a = embed("disk full on /var");
        let b = embed("nginx returns 502");
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn test_cosine_self_similarity_is_one() {
        let v = vec![0.3, -1.2, 4.0, 0.0, 2.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-12);

        let e = embed("database connection pool exhausted");
        assert!((cosine_similarity(&e, &e) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_dimension_mismatch_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[1.0]), 0.0);
    }

    #[test]
    fn test_cosine_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_cosine_opposite_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-12);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]), 0.0);
    }
}
