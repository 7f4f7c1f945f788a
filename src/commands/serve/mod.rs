//! Form server for sesmatch
//!
//! Serves the matching form and the JSON API its buttons call:
//! - `GET /` the form
//! - `GET /health`, `GET /api/state`
//! - `POST /api/register`, `POST /api/search`
//!
//! Design: Blocking HTTP microserver (no async/tokio), TCP only.

mod internal;
pub(crate) mod microserver;

use anyhow::Result;

use sesmatch::Config;

/// Options for the serve command
#[derive(Debug, Default)]
pub struct ServeOptions {
    /// Random vectors and in-memory store instead of hosted services
    pub offline: bool,
}

/// Start the form server
pub fn execute(config: &Config, options: ServeOptions) -> Result<()> {
    internal::run_server(config, options)
}
