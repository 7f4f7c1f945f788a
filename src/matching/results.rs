//! Shaping search results for display

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One match returned by the vector store.
///
/// Fields the store returns beyond the known ones are kept in `extra` and
/// serialized back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Strip raw vector values from each match.
///
/// Order and every other field are kept as the store returned them; the
/// store's ranking is not second-guessed.
pub fn shape_results(matches: Vec<Match>) -> Vec<Match> {
    matches
        .into_iter()
        .map(|m| Match { values: None, ..m })
        .collect()
}
