use crate::embeddings::Embedder;
use crate::error::{EmbeddingError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "nomic-embed-text";

/// Connection settings for an Ollama server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaConfig {
    pub endpoint: String,
    pub model: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Extra attempts after a transient failure
    pub max_retries: u32,
    /// Delay before the first retry; grows linearly with each attempt
    pub retry_backoff: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

impl OllamaConfig {
    /// Defaults overridden by `SEMALIGN_OLLAMA_URL` and `SEMALIGN_MODEL`
    #[must_use]
    pub fn from_env() -> Self {
        let non_empty = |key: &str| {
            env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();
        Self {
            endpoint: non_empty("SEMALIGN_OLLAMA_URL").unwrap_or(defaults.endpoint),
            model: non_empty("SEMALIGN_MODEL").unwrap_or(defaults.model),
            ..defaults
        }
    }

    fn embed_url(&self) -> String {
        format!("{}/api/embed", self.endpoint.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embeddings from a running Ollama server (`POST /api/embed`)
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: Client,
    config: OllamaConfig,
}

impl OllamaEmbedder {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub const fn config(&self) -> &OllamaConfig {
        &self.config
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(self.config.embed_url())
            .json(&EmbedRequest {
                model: &self.config.model,
                input: texts,
            })
            .send()
            .await?
            .error_for_status()?;

        let body: EmbedResponse = response.json().await?;
        if body.embeddings.len() != texts.len() {
            return Err(EmbeddingError::backend(format!(
                "Ollama returned {} embeddings for {} inputs",
                body.embeddings.len(),
                texts.len()
            )));
        }
        Ok(body.embeddings)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_id(&self) -> &str {
        &self.config.model
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut attempt = 0;
        loop {
            match self.request(texts).await {
                Ok(vectors) => return Ok(vectors),
                Err(err) if err.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = self.config.retry_backoff * attempt;
                    log::warn!(
                        "Ollama embed failed (attempt {attempt}/{}): {err}; retrying in {delay:?}",
                        self.config.max_retries + 1
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
