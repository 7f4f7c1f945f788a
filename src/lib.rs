pub mod config;
pub mod embeddings;
pub mod form;
pub mod matching;
pub mod paths;
pub mod vector_store;

// Re-export commonly used types
pub use config::Config;
pub use form::{Action, ApiResponse, FormState, Services};
pub use matching::{Category, Entry, QueryFilter, Revision};

use tracing_subscriber::EnvFilter;

/// Initialize structured logging with tracing.
/// Respects RUST_LOG; defaults to `info` for this crate. Logs go to stderr
/// so JSON on stdout stays parseable.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sesmatch=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
