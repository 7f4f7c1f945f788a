//! Query filter construction
//!
//! Filters are conjunctions of equality clauses in the vector database's
//! metadata dialect:
//!
//! ```text
//! {"id": {"$eq": "E-42"}}
//! {"category": {"$eq": "engineer"}}
//! {"$and": [{"id": {"$eq": "E-42"}}, {"category": {"$eq": "engineer"}}]}
//! ```

use serde::ser::{Serialize, Serializer};
use serde_json::{json, Map, Value};

use super::category::Category;
use super::payload::Entry;

/// Maximum matches requested per search
pub const TOP_K: usize = 2;

/// Metadata predicate sent with a search.
///
/// One variant per combination of present fields. "No filter" is `None`
/// at the call site, never an empty variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFilter {
    /// `id == value`
    Id(String),
    /// `category == target`, where target is already the complement
    Category(Category),
    /// Both clauses combined with AND
    IdAndCategory { id: String, category: Category },
}

impl QueryFilter {
    /// Equality clauses as (field, value) pairs, in wire order
    pub fn clauses(&self) -> Vec<(&'static str, &str)> {
        match self {
            QueryFilter::Id(id) => vec![("id", id.as_str())],
            QueryFilter::Category(category) => vec![("category", category.as_str())],
            QueryFilter::IdAndCategory { id, category } => {
                vec![("id", id.as_str()), ("category", category.as_str())]
            }
        }
    }

    /// Category a search with this filter is restricted to, if any
    pub fn target_category(&self) -> Option<Category> {
        match self {
            QueryFilter::Id(_) => None,
            QueryFilter::Category(category) | QueryFilter::IdAndCategory { category, .. } => {
                Some(*category)
            }
        }
    }

    /// Evaluate the predicate against a record's metadata
    pub fn matches(&self, metadata: &Map<String, Value>) -> bool {
        self.clauses()
            .into_iter()
            .all(|(field, expected)| metadata.get(field).and_then(Value::as_str) == Some(expected))
    }

    /// Wire representation
    pub fn to_json(&self) -> Value {
        let mut clauses: Vec<Value> = self
            .clauses()
            .into_iter()
            .map(|(field, value)| json!({ field: { "$eq": value } }))
            .collect();

        if clauses.len() == 1 {
            clauses.remove(0)
        } else {
            json!({ "$and": clauses })
        }
    }
}

impl Serialize for QueryFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Build the filter for a search.
///
/// An empty `id` counts as absent. The category clause always names the
/// complement of the selected category.
pub fn build_query_filter(id: Option<&str>, category: Option<Category>) -> Option<QueryFilter> {
    let id = id.filter(|id| !id.is_empty());

    match (id, category) {
        (None, None) => None,
        (Some(id), None) => Some(QueryFilter::Id(id.to_string())),
        (None, Some(selected)) => Some(QueryFilter::Category(selected.complement())),
        (Some(id), Some(selected)) => Some(QueryFilter::IdAndCategory {
            id: id.to_string(),
            category: selected.complement(),
        }),
    }
}

/// Search request as sent to the vector store (namespace is added by the store)
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub top_k: usize,
    pub vector: Vec<f32>,
    pub include_values: bool,
    pub include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<QueryFilter>,
}

/// Build a search request for an entry and its query vector
pub fn build_query_request(entry: &Entry, vector: Vec<f32>) -> QueryRequest {
    QueryRequest {
        top_k: TOP_K,
        vector,
        include_values: true,
        include_metadata: true,
        filter: build_query_filter(Some(entry.id.as_str()), entry.category),
    }
}
