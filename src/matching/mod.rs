//! Request building and result shaping for the matching form
//!
//! Everything here is pure: form fields go in, wire payloads come out.
//! Network calls live in [`crate::embeddings`] and [`crate::vector_store`].
//!
//! # Flow
//!
//! ```text
//! Entry ──► build_upsert_payload ──► UpsertRecord          (register)
//! Entry ──► build_query_filter   ──► QueryFilter ──► QueryRequest (search)
//! Vec<Match> ──► shape_results ──► Vec<Match> without values
//! ```

mod category;
mod filter;
mod payload;
mod results;

pub use category::{Category, Revision};
pub use filter::{build_query_filter, build_query_request, QueryFilter, QueryRequest, TOP_K};
pub use payload::{
    build_upsert_payload, random_vector, Entry, RecordIdGenerator, RecordIdScheme,
    RecordMetadata, UpsertRecord, MOCK_VECTOR_DIMENSION,
};
pub use results::{shape_results, Match};
