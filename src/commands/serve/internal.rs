//! Internal implementation of the form server

use anyhow::{Context, Result};
use colored::Colorize;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use super::microserver::{self, HttpRequest, HttpResponse};
use super::ServeOptions;
use sesmatch::form::{run_action, ActionError, Services};
use sesmatch::{Action, Category, Config, FormState};

/// The form page; talks to the JSON API below
const FORM_HTML: &str = include_str!("form.html");

impl HttpResponse {
    /// Create a JSON response
    fn json(status: u16, value: &impl Serialize) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: serde_json::to_vec(value).unwrap_or_default(),
        }
    }

    fn html(body: &str) -> Self {
        Self {
            status: 200,
            headers: vec![(
                "Content-Type".to_string(),
                "text/html; charset=utf-8".to_string(),
            )],
            body: body.as_bytes().to_vec(),
        }
    }

    /// Add a header
    fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

// === Server state ===

/// Server state shared across connections.
///
/// Holds exactly one form instance; its lock is never held across an
/// external call.
pub struct ServerState {
    start_time: Instant,
    version: String,
    services: Services,
    form: Mutex<FormState>,
}

impl ServerState {
    pub fn new(services: Services) -> Self {
        let form = FormState::new(services.revision());
        Self {
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            services,
            form: Mutex::new(form),
        }
    }

    fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

// === API types ===

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_secs: u64,
}

/// Body of POST /api/register and POST /api/search
#[derive(Deserialize)]
struct ActionRequest {
    #[serde(default)]
    content: String,
    #[serde(default)]
    id: String,
    #[serde(default)]
    category: Option<Category>,
}

// === Helpers ===

/// Add security headers to response
fn with_security_headers(response: HttpResponse) -> HttpResponse {
    response
        .with_header("X-Content-Type-Options", "nosniff")
        .with_header("X-Frame-Options", "DENY")
}

/// Consistent JSON error response
fn json_error(status: u16, message: &str) -> HttpResponse {
    HttpResponse::json(status, &serde_json::json!({"error": message}))
}

// === Handlers ===

/// Route request to handler
fn route_request(request: &HttpRequest, state: &ServerState) -> HttpResponse {
    let response = match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/") | ("GET", "/index.html") => HttpResponse::html(FORM_HTML),
        ("GET", "/health") => handle_health(state),
        ("GET", "/api/state") => handle_state(state),
        ("POST", "/api/register") => handle_action(request, state, Action::Register),
        ("POST", "/api/search") => handle_action(request, state, Action::Search),
        _ => json_error(404, "Not found"),
    };
    with_security_headers(response)
}

/// Handle GET /health
fn handle_health(state: &ServerState) -> HttpResponse {
    HttpResponse::json(
        200,
        &HealthResponse {
            status: "ok".to_string(),
            version: state.version.clone(),
            uptime_secs: state.uptime_secs(),
        },
    )
}

/// Handle GET /api/state
fn handle_state(state: &ServerState) -> HttpResponse {
    let form = state.form.lock().clone();
    HttpResponse::json(200, &form)
}

/// Handle POST /api/register and POST /api/search
///
/// Failures of the external calls still answer 200 with the form state:
/// the previous response stays, `last_failure` says which call failed.
fn handle_action(request: &HttpRequest, state: &ServerState, action: Action) -> HttpResponse {
    if request.body.is_empty() {
        return json_error(400, "Missing request body");
    }

    let body: ActionRequest = match serde_json::from_slice(&request.body) {
        Ok(req) => req,
        Err(e) => return json_error(400, &format!("Invalid JSON: {}", e)),
    };

    let submitting = {
        let mut form = state.form.lock();
        if form.is_busy() {
            return json_error(409, &ActionError::Busy.to_string());
        }

        let updated = form
            .clone()
            .with_fields(body.content, body.id, body.category);
        match updated.begin(action) {
            Ok(next) => {
                *form = next.clone();
                next
            }
            Err(e) => {
                *form = updated;
                let status = if matches!(e, ActionError::Busy) { 409 } else { 400 };
                return json_error(status, &e.to_string());
            }
        }
    };

    // A panic must not leave the shared form stuck in Submitting
    let entry = submitting.entry();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        run_action(&state.services, action, &entry)
    }))
    .unwrap_or(Err(ActionError::Aborted));
    let settled = submitting.finish(outcome).settle();
    *state.form.lock() = settled.clone();

    HttpResponse::json(200, &settled)
}

// === Transport: microserver accept loop ===
// One request per connection. Thread per connection.

/// Handle one connection on any Read + Write stream.
fn handle_connection(stream: &mut (impl Read + Write), state: &ServerState) {
    let req = match microserver::read_request(stream) {
        Ok(Some(req)) => req,
        Ok(None) => return,
        Err(e) => {
            tracing::debug!(error = %e, "rejecting request");
            let resp = with_security_headers(json_error(e.status(), &e.to_string()));
            microserver::write_response(stream, &resp);
            return;
        }
    };

    let resp = route_request(&req, state);

    tracing::debug!(
        method = %req.method,
        path = %req.path,
        status = resp.status,
        agent = req.header("User-Agent").unwrap_or("-"),
        "request"
    );
    microserver::write_response(stream, &resp);
}

/// Run the form server until the process is stopped
pub fn run_server(config: &Config, options: ServeOptions) -> Result<()> {
    let services = if options.offline {
        Services::offline(config)
    } else {
        Services::from_config(config)?
    };
    let state = Arc::new(ServerState::new(services));

    let host = &config.server.host;
    let addr = format!("{}:{}", host, config.server.port);
    if host != "127.0.0.1" && host != "localhost" {
        tracing::warn!(
            host = %host,
            "binding beyond loopback exposes the form, and the API keys behind it, to the network"
        );
    }

    let listener =
        TcpListener::bind(&addr).with_context(|| format!("Failed to bind {}", addr))?;

    println!("{}", "sesmatch form server starting...".bold());
    println!("   Revision:  {}", config.form.revision);
    if options.offline {
        println!("   Mode:      {}", "offline (random vectors, in-memory store)".yellow());
    }
    println!("   Open:      http://{}", addr);
    println!("   Press Ctrl+C to stop\n");

    accept_loop(listener, state);
    Ok(())
}

fn accept_loop(listener: TcpListener, state: Arc<ServerState>) {
    for stream in listener.incoming() {
        match stream {
            Ok(mut stream) => {
                let state = Arc::clone(&state);
                std::thread::spawn(move || {
                    handle_connection(&mut stream, &state);
                    let _ = stream.shutdown(Shutdown::Write);
                });
            }
            Err(e) => tracing::warn!(error = %e, "TCP accept error"),
        }
    }
}
