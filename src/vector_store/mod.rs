//! Vector store module - where registered entries live and searches run
//!
//! The hosted vector database owns indexing and ranking. [`MemoryStore`]
//! mimics its upsert/query contract for offline runs and tests.

mod memory;
mod pinecone;

pub use memory::MemoryStore;
pub use pinecone::PineconeStore;

use anyhow::Result;

use crate::config::Config;
use crate::matching::{Match, QueryRequest, UpsertRecord};

/// Upsert/query contract of a vector database bound to one index and namespace
pub trait VectorStore: Send + Sync {
    /// Insert or replace records by ID, returning how many were written
    fn upsert(&self, records: &[UpsertRecord]) -> Result<usize>;

    /// Nearest matches, best first, at most `request.top_k`
    fn query(&self, request: &QueryRequest) -> Result<Vec<Match>>;

    /// Namespace every call goes to
    fn namespace(&self) -> &str;
}

/// Create the hosted store from configuration
pub fn create_store(config: &Config) -> Result<Box<dyn VectorStore>> {
    Ok(Box::new(PineconeStore::new(
        &config.vector_store,
        config.credentials.pinecone_api_key.clone(),
    )?))
}
