//! Mistral AI client for embeddings and chat completions with retry logic

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::{EmbeddingConfig, ProviderConfig};
use crate::error::{Error, Result};
use crate::generation::{ChatMessage, PromptBuilder};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;

const MAX_ERROR_BODY: usize = 500;
const BASE_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 30_000;

/// A failed attempt and whether trying again could help
struct Failure {
    error: Error,
    retryable: bool,
}

impl Failure {
    /// Transport failures (connect, timeout) are worth another attempt
    fn transport(error: Error) -> Self {
        Self { error, retryable: true }
    }

    /// Rate limits and server errors are retried; other statuses are final
    fn status(status: reqwest::StatusCode, error: Error) -> Self {
        Self {
            error,
            retryable: status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
        }
    }

    fn fatal(error: Error) -> Self {
        Self { error, retryable: false }
    }
}

/// Delay before retry number `attempt + 1`, doubling from 500ms up to 30s
fn backoff(attempt: u32) -> Duration {
    let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(BASE_BACKOFF_MS.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

/// Mistral API client with automatic retry
///
/// Speaks the OpenAI-compatible `/embeddings` and `/chat/completions` endpoints.
pub struct MistralClient {
    client: Client,
    base_url: String,
    chat_model: String,
    embedding_model: String,
    temperature: f32,
    dimensions: usize,
    batch_size: usize,
    max_retries: u32,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

impl MistralClient {
    /// Create a new client from provider and embedding settings
    pub fn new(provider: &ProviderConfig, embeddings: &EmbeddingConfig) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", provider.api_key.expose()))
            .map_err(|_| Error::Config("API key contains characters not allowed in a header".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .timeout(Duration::from_secs(provider.request_timeout_secs))
            .default_headers(headers)
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: provider.base_url.trim_end_matches('/').to_string(),
            chat_model: provider.chat_model.clone(),
            embedding_model: provider.embedding_model.clone(),
            temperature: provider.temperature,
            dimensions: embeddings.dimensions,
            batch_size: embeddings.batch_size.max(1),
            max_retries: provider.max_retries,
            timeout_secs: provider.request_timeout_secs,
        })
    }

    /// Retry a request with exponential backoff while failures are transient
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, Failure>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(failure) if failure.retryable && attempt < self.max_retries => {
                    let delay = backoff(attempt);
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}. Retrying in {:?}",
                        attempt + 1,
                        self.max_retries.saturating_add(1),
                        failure.error,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }

    fn describe(&self, err: reqwest::Error) -> String {
        if err.is_timeout() {
            format!("request timed out after {}s", self.timeout_secs)
        } else if err.is_connect() {
            format!("could not connect to {}", self.base_url)
        } else {
            err.to_string()
        }
    }

    async fn request_embeddings(&self, inputs: &[String]) -> std::result::Result<Vec<Vec<f32>>, Failure> {
        let url = format!("{}/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: inputs,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                Failure::transport(Error::embedding(format!(
                    "Embedding request failed: {}",
                    self.describe(e)
                )))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Failure::status(
                status,
                Error::embedding(format!("Embedding failed: HTTP {} - {}", status, truncate(&body))),
            ));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            Failure::fatal(Error::embedding(format!("Failed to parse embedding response: {}", e)))
        })?;

        if parsed.data.len() != inputs.len() {
            return Err(Failure::fatal(Error::embedding(format!(
                "Expected {} embeddings, received {}",
                inputs.len(),
                parsed.data.len()
            ))));
        }

        parsed.data.sort_by_key(|d| d.index);

        let mut vectors = Vec::with_capacity(parsed.data.len());
        for item in parsed.data {
            if item.embedding.len() != self.dimensions {
                return Err(Failure::fatal(Error::embedding(format!(
                    "Embedding has {} dimensions, expected {}",
                    item.embedding.len(),
                    self.dimensions
                ))));
            }
            vectors.push(item.embedding);
        }

        Ok(vectors)
    }

    async fn request_completion(&self, messages: &[ChatMessage]) -> std::result::Result<String, Failure> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.chat_model,
            messages,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                Failure::transport(Error::generation(format!(
                    "Generation request failed: {}",
                    self.describe(e)
                )))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Failure::status(
                status,
                Error::generation(format!("Generation failed: HTTP {} - {}", status, truncate(&body))),
            ));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            Failure::fatal(Error::generation(format!("Failed to parse generation response: {}", e)))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Failure::fatal(Error::generation("response contained no answer")))
    }

    async fn ping(&self) -> bool {
        let url = format!("{}/models", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("Mistral health check failed: {}", self.describe(e));
                false
            }
        }
    }
}

fn truncate(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY {
        body.to_string()
    } else {
        let head: String = body.chars().take(MAX_ERROR_BODY).collect();
        format!("{}...", head)
    }
}

#[async_trait]
impl EmbeddingProvider for MistralClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let vectors = self.retry_request(|| self.request_embeddings(batch)).await?;
            all.extend(vectors);
        }

        tracing::debug!("Generated {} embeddings with {}", all.len(), self.embedding_model);
        Ok(all)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.ping().await)
    }

    fn name(&self) -> &str {
        "mistral"
    }
}

#[async_trait]
impl LlmProvider for MistralClient {
    async fn generate_answer(&self, question: &str, context: &str) -> Result<String> {
        let messages = PromptBuilder::build_messages(question, context);

        tracing::info!("Generating answer with model: {}", self.chat_model);

        self.retry_request(|| self.request_completion(&messages)).await
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.ping().await)
    }

    fn name(&self) -> &str {
        "mistral"
    }

    fn model(&self) -> &str {
        &self.chat_model
    }
}
