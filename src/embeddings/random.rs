//! Random vectors for running the form without an embedding service

use super::EmbeddingEngine;
use crate::matching::random_vector;
use anyhow::Result;

/// Ignores the text and returns uniform noise of a fixed length
pub struct RandomEmbedder {
    dimension: usize,
}

impl RandomEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl EmbeddingEngine for RandomEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(random_vector(self.dimension))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "random"
    }
}
