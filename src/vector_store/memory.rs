//! In-process vector store with the same contract as the hosted one

use anyhow::{bail, Result};
use parking_lot::RwLock;
use serde_json::{Map, Value};

use super::VectorStore;
use crate::embeddings::cosine_similarity;
use crate::matching::{Match, QueryRequest, UpsertRecord};

struct StoredRecord {
    id: String,
    values: Vec<f32>,
    metadata: Map<String, Value>,
}

/// Brute-force cosine search over records kept in memory
pub struct MemoryStore {
    namespace: String,
    records: RwLock<Vec<StoredRecord>>,
}

impl MemoryStore {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl VectorStore for MemoryStore {
    fn upsert(&self, records: &[UpsertRecord]) -> Result<usize> {
        let mut stored = self.records.write();

        // A batch is accepted or rejected whole
        let dimension = stored
            .first()
            .map(|r| r.values.len())
            .or_else(|| records.first().map(|r| r.values.len()));
        if let Some(bad) = records
            .iter()
            .find(|r| Some(r.values.len()) != dimension)
        {
            bail!(
                "Vector dimension {} of {} does not match index dimension {}",
                bad.values.len(),
                bad.id,
                dimension.unwrap_or_default()
            );
        }

        let incoming = records
            .iter()
            .map(|record| {
                let metadata = match serde_json::to_value(&record.metadata)? {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                Ok(StoredRecord {
                    id: record.id.clone(),
                    values: record.values.clone(),
                    metadata,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        for record in incoming {
            match stored.iter_mut().find(|r| r.id == record.id) {
                Some(slot) => *slot = record,
                None => stored.push(record),
            }
        }

        Ok(records.len())
    }

    fn query(&self, request: &QueryRequest) -> Result<Vec<Match>> {
        let stored = self.records.read();

        if let Some(existing) = stored.first() {
            if existing.values.len() != request.vector.len() {
                bail!(
                    "Query vector dimension {} does not match index dimension {}",
                    request.vector.len(),
                    existing.values.len()
                );
            }
        }

        let mut scored: Vec<(f32, &StoredRecord)> = stored
            .iter()
            .filter(|r| {
                request
                    .filter
                    .as_ref()
                    .map_or(true, |filter| filter.matches(&r.metadata))
            })
            .map(|r| (cosine_similarity(&request.vector, &r.values), r))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(request.top_k);

        Ok(scored
            .into_iter()
            .map(|(score, r)| Match {
                id: r.id.clone(),
                score: Some(score),
                values: request.include_values.then(|| r.values.clone()),
                metadata: request.include_metadata.then(|| r.metadata.clone()),
                extra: Map::new(),
            })
            .collect())
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}
