//! Hosted vector database client (Pinecone REST API)
//!
//! Two planes:
//! - control plane: `GET {controller}/indexes/{index}` tells us the data host
//! - data plane: `POST {host}/vectors/upsert` and `POST {host}/query`

use anyhow::{bail, Context, Result};
use parking_lot::Mutex;
use reqwest::blocking::{Client as HttpClient, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::VectorStore;
use crate::config::VectorStoreConfig;
use crate::matching::{Match, QueryRequest, UpsertRecord};

/// REST API version pinned in every request
const API_VERSION: &str = "2024-07";

/// Client bound to one index and namespace
pub struct PineconeStore {
    api_key: String,
    controller_url: String,
    index: String,
    namespace: String,
    /// Data plane base URL, resolved on first use
    host: Mutex<Option<String>>,
    http: HttpClient,
}

#[derive(Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

#[derive(Serialize)]
struct UpsertBody<'a> {
    vectors: &'a [UpsertRecord],
    namespace: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Serialize)]
struct QueryBody<'a> {
    namespace: &'a str,
    #[serde(flatten)]
    request: &'a QueryRequest,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

/// Prefix bare hosts with https://, keep explicit schemes
fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

impl PineconeStore {
    /// Create a client. Nothing is contacted until the first call.
    pub fn new(config: &VectorStoreConfig, api_key: String) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key,
            controller_url: config.controller_url.trim_end_matches('/').to_string(),
            index: config.index.clone(),
            namespace: config.namespace.clone(),
            host: Mutex::new(config.index_host.as_deref().map(normalize_host)),
            http,
        })
    }

    /// Data plane URL for the index, looked up once per process
    fn data_host(&self) -> Result<String> {
        let mut cached = self.host.lock();
        if let Some(host) = cached.as_ref() {
            return Ok(host.clone());
        }

        let url = format!("{}/indexes/{}", self.controller_url, self.index);
        tracing::debug!(index = %self.index, "resolving index host");
        let response = self
            .http
            .get(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .with_context(|| format!("Failed to reach vector database at {}", self.controller_url))?;

        let described: DescribeIndexResponse = check_status(response, "describe index")?
            .json()
            .context("Failed to parse describe index response")?;

        let host = normalize_host(&described.host);
        tracing::info!(index = %self.index, host = %host, "resolved index host");
        *cached = Some(host.clone());
        Ok(host)
    }

    fn post(&self, path: &str, body: &impl Serialize) -> Result<Response> {
        let url = format!("{}{}", self.data_host()?, path);
        self.http
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .with_context(|| format!("Failed to send request to {}", url))
    }
}

fn check_status(response: Response, operation: &str) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().unwrap_or_default();
    bail!("Vector database {} failed ({}): {}", operation, status, body)
}

impl VectorStore for PineconeStore {
    fn upsert(&self, records: &[UpsertRecord]) -> Result<usize> {
        let response = self.post(
            "/vectors/upsert",
            &UpsertBody {
                vectors: records,
                namespace: &self.namespace,
            },
        )?;

        let parsed: UpsertResponse = check_status(response, "upsert")?
            .json()
            .context("Failed to parse upsert response")?;

        tracing::info!(
            namespace = %self.namespace,
            upserted = parsed.upserted_count,
            "upsert complete"
        );
        Ok(parsed.upserted_count)
    }

    fn query(&self, request: &QueryRequest) -> Result<Vec<Match>> {
        let response = self.post(
            "/query",
            &QueryBody {
                namespace: &self.namespace,
                request,
            },
        )?;

        let parsed: QueryResponse = check_status(response, "query")?
            .json()
            .context("Failed to parse query response")?;

        tracing::info!(
            namespace = %self.namespace,
            matches = parsed.matches.len(),
            "query complete"
        );
        Ok(parsed.matches)
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}
