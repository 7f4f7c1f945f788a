//! Similarity metric used by the in-memory vector store

/// Compute cosine similarity between two embedding vectors
///
/// Returns a value between -1.0 and 1.0; zero-magnitude input scores 0.0.
///
/// # Panics
/// Panics if vectors have different dimensions
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(
        a.len(),
        b.len(),
        "Vectors must have same dimension: {} vs {}",
        a.len(),
        b.len()
    );

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ignores_vector_length() {
        // Embeddings of different norms rank by direction only
        let query = [1.0, 0.1];
        assert_relative_eq!(
            cosine_similarity(&query, &[1.0, 0.0]),
            cosine_similarity(&query, &[25.0, 0.0]),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_orders_candidates_by_direction() {
        let query = [1.0, 0.1];
        let near = cosine_similarity(&query, &[1.0, 0.0]);
        let diagonal = cosine_similarity(&query, &[0.7, 0.7]);
        let far = cosine_similarity(&query, &[0.0, 1.0]);

        assert!(near > diagonal && diagonal > far);
        assert_relative_eq!(diagonal, 0.7739, epsilon = 1e-3);
    }

    #[test]
    fn test_opposite_and_degenerate_vectors() {
        assert_relative_eq!(cosine_similarity(&[0.5, -0.5], &[-1.0, 1.0]), -1.0, epsilon = 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    #[should_panic(expected = "Vectors must have same dimension")]
    fn test_dimension_mismatch_panics() {
        cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]);
    }
}
