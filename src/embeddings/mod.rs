//! Embeddings module - turn form content into vectors
//!
//! Trait-based so the form can run against the hosted embedding service,
//! the random mock of the earliest revision, or a test double.

mod openai;
mod random;
mod similarity;

pub use openai::OpenAiEmbedder;
pub use random::RandomEmbedder;
pub use similarity::cosine_similarity;

use anyhow::Result;

use crate::config::Config;

/// Trait for embedding generation engines
///
/// Requires Send + Sync: one engine is shared by every connection the
/// form server accepts.
pub trait EmbeddingEngine: Send + Sync {
    /// Generate embedding for a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get embedding dimension (e.g., 1536 for text-embedding-ada-002)
    fn dimension(&self) -> usize;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Create the embedder the configured revision calls for
pub fn create_embedder(config: &Config) -> Result<Box<dyn EmbeddingEngine>> {
    if config.form.revision.uses_random_vectors() {
        return Ok(Box::new(RandomEmbedder::new(config.embedding.dimension)));
    }

    Ok(Box::new(OpenAiEmbedder::new(
        &config.embedding,
        config.credentials.openai_api_key.clone(),
    )?))
}
