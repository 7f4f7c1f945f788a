//! Hosted embedding service client (OpenAI-compatible `/v1/embeddings`)

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::EmbeddingEngine;
use crate::config::EmbeddingConfig;

/// Embedding engine backed by the hosted embedding API
pub struct OpenAiEmbedder {
    endpoint: String,
    model: String,
    dimension: usize,
    api_key: String,
    http: HttpClient,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    /// Create a client. An empty key is accepted; the service rejects it later.
    pub fn new(config: &EmbeddingConfig, api_key: String) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            dimension: config.dimension,
            api_key,
            http,
        })
    }
}

impl EmbeddingEngine for OpenAiEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        tracing::debug!(model = %self.model, chars = text.chars().count(), "requesting embedding");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&EmbedRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .with_context(|| format!("Failed to reach embedding service at {}", self.endpoint))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            bail!("Embedding service returned {}: {}", status, body);
        }

        let parsed: EmbedResponse = response
            .json()
            .context("Failed to parse embedding response")?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .context("Embedding response contained no vectors")?;

        tracing::debug!(dimension = embedding.len(), "embedding received");
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
