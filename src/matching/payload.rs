//! Entries and upsert payloads

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

use super::category::{Category, Revision};

/// Vector length used when the form runs without an embedding service.
///
/// Matches the embedding model of the later revisions so mock records and
/// real records can share one index.
pub const MOCK_VECTOR_DIMENSION: usize = 1536;

/// One submission of the form
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Entry {
    /// Free text, required non-empty before submit
    pub content: String,
    /// Optional identifier, empty when not given
    #[serde(default)]
    pub id: String,
    /// Selected category (categorized revision only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl Entry {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Drop the fields a revision does not have
    pub fn for_revision(mut self, revision: Revision) -> Self {
        if !revision.has_id_field() {
            self.id.clear();
        }
        if !revision.has_categories() {
            self.category = None;
        }
        self
    }
}

/// Metadata stored alongside each vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub content: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

/// Record written by a register action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: RecordMetadata,
}

/// Build the record for a register action.
///
/// `record_id` comes from a [`RecordIdGenerator`], `values` from the
/// embedding engine (or [`random_vector`] in the mock revision).
pub fn build_upsert_payload(entry: &Entry, record_id: String, values: Vec<f32>) -> UpsertRecord {
    UpsertRecord {
        id: record_id,
        values,
        metadata: RecordMetadata {
            content: entry.content.clone(),
            id: entry.id.clone(),
            category: entry.category,
        },
    }
}

/// Fixed-length vector of uniform floats in [0, 1)
pub fn random_vector(dimension: usize) -> Vec<f32> {
    (0..dimension).map(|_| fastrand::f32()).collect()
}

/// How record identifiers are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordIdScheme {
    /// `vec-<unix millis>`, strictly increasing within this process
    #[default]
    Timestamp,
    /// `vec-<uuid v4>`
    Uuid,
}

/// Record identifier source.
///
/// The timestamp scheme has no collision check against the store: two
/// processes registering in the same millisecond produce the same ID and
/// the second upsert overwrites the first. Within one process IDs never
/// repeat. Use [`RecordIdScheme::Uuid`] when several writers share an index.
#[derive(Debug, Default)]
pub struct RecordIdGenerator {
    scheme: RecordIdScheme,
    last_millis: AtomicI64,
}

impl RecordIdGenerator {
    pub fn new(scheme: RecordIdScheme) -> Self {
        Self {
            scheme,
            last_millis: AtomicI64::new(0),
        }
    }

    pub fn scheme(&self) -> RecordIdScheme {
        self.scheme
    }

    pub fn next_id(&self) -> String {
        match self.scheme {
            RecordIdScheme::Timestamp => format!("vec-{}", self.next_millis()),
            RecordIdScheme::Uuid => format!("vec-{}", uuid::Uuid::new_v4()),
        }
    }

    /// Current time in millis, bumped past the last value handed out
    fn next_millis(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let previous = self
            .last_millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        now.max(previous + 1)
    }
}
