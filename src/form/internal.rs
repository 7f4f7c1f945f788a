//! Running actions against the external collaborators

use anyhow::Result;

use super::{Action, ActionError, ApiResponse, FormState};
use crate::config::Config;
use crate::embeddings::{self, EmbeddingEngine, RandomEmbedder};
use crate::matching::{
    build_query_request, build_upsert_payload, shape_results, Entry, RecordIdGenerator, Revision,
};
use crate::vector_store::{self, MemoryStore, VectorStore};

/// External collaborators an action calls, shared by every form instance
pub struct Services {
    revision: Revision,
    embedder: Box<dyn EmbeddingEngine>,
    store: Box<dyn VectorStore>,
    record_ids: RecordIdGenerator,
}

impl Services {
    pub fn new(
        revision: Revision,
        embedder: Box<dyn EmbeddingEngine>,
        store: Box<dyn VectorStore>,
        record_ids: RecordIdGenerator,
    ) -> Self {
        Self {
            revision,
            embedder,
            store,
            record_ids,
        }
    }

    /// Hosted embedding service and vector database, as configured
    pub fn from_config(config: &Config) -> Result<Self> {
        let revision = config.form.revision;
        tracing::info!(
            revision = %revision,
            index = %config.vector_store.index,
            namespace = %config.vector_store.namespace,
            "using hosted services"
        );

        Ok(Self::new(
            revision,
            embeddings::create_embedder(config)?,
            vector_store::create_store(config)?,
            RecordIdGenerator::new(config.form.record_ids),
        ))
    }

    /// Random vectors and an in-memory store; needs no credentials
    pub fn offline(config: &Config) -> Self {
        tracing::info!(revision = %config.form.revision, "using offline services");
        Self::new(
            config.form.revision,
            Box::new(RandomEmbedder::new(config.embedding.dimension)),
            Box::new(MemoryStore::new(config.vector_store.namespace.clone())),
            RecordIdGenerator::new(config.form.record_ids),
        )
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }
}

/// Run one action end to end: embed, then upsert or query.
///
/// The two calls are sequential; the store is never contacted when the
/// embedding fails.
pub fn run_action(
    services: &Services,
    action: Action,
    entry: &Entry,
) -> Result<ApiResponse, ActionError> {
    if entry.content.is_empty() {
        return Err(ActionError::EmptyContent);
    }
    let entry = entry.clone().for_revision(services.revision);

    let vector = services
        .embedder
        .embed(&entry.content)
        .map_err(ActionError::Embedding)?;

    let content = match action {
        Action::Register => {
            let record = build_upsert_payload(&entry, services.record_ids.next_id(), vector);
            tracing::info!(record_id = %record.id, "registering entry");
            services
                .store
                .upsert(std::slice::from_ref(&record))
                .map_err(ActionError::VectorStore)?;
            register_summary(&entry)
        }
        Action::Search => {
            let request = build_query_request(&entry, vector);
            tracing::info!(filter = ?request.filter, top_k = request.top_k, "searching");
            let matches = services
                .store
                .query(&request)
                .map_err(ActionError::VectorStore)?;
            let cleaned = shape_results(matches);
            let rendered = serde_json::to_string(&cleaned)
                .map_err(|e| ActionError::VectorStore(e.into()))?;
            search_summary(&entry, &rendered)
        }
    };

    Ok(ApiResponse {
        message: "Success".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        content,
        action,
    })
}

fn register_summary(entry: &Entry) -> String {
    let mut summary = format!("Registered: {}", entry.content);
    if !entry.id.is_empty() {
        summary.push_str(&format!(", ID: {}", entry.id));
    }
    if let Some(category) = entry.category {
        summary.push_str(&format!(", category: {}", category));
    }
    summary
}

fn search_summary(entry: &Entry, rendered_matches: &str) -> String {
    match entry.category {
        Some(selected) => format!(
            "Search results ({} searching, {} extracted): {}",
            selected,
            selected.complement(),
            rendered_matches
        ),
        None => format!("Search results: {}", rendered_matches),
    }
}

/// Full cycle for one form instance: begin, run, finish, settle.
///
/// Never fails. A refused submit returns the state untouched; a failed
/// action returns it with the previous response still in place.
pub fn submit(state: FormState, action: Action, services: &Services) -> FormState {
    let submitting = match state.begin(action) {
        Ok(next) => next,
        Err(refused) => {
            tracing::warn!(action = action.as_str(), reason = %refused, "submit refused");
            return state;
        }
    };

    let outcome = run_action(services, action, &submitting.entry());
    submitting.finish(outcome).settle()
}
