use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::EmbeddingCache;
use crate::config::Config;
use crate::error::{Result, SitegraphError};

/// Request structure for the OpenAI embeddings API
#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

/// Response structure from the OpenAI embeddings API
#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// OpenAI embeddings client.
///
/// Splits large inputs into API-sized batches, retries transient failures
/// with exponential backoff, enforces the configured vector dimension on
/// every response, and optionally caches query embeddings in an LRU cache.
pub struct OpenAIEmbedder {
    client: Client,
    api_key: String,
    model: String,
    batch_size: usize,
    dimensions: usize,
    cache: Option<Arc<EmbeddingCache>>,
}

impl OpenAIEmbedder {
    /// Create an embedder. `batch_size` is capped at the API limit of 2048.
    pub fn new(
        api_key: String,
        model: String,
        batch_size: usize,
        dimensions: usize,
        cache: Option<Arc<EmbeddingCache>>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| SitegraphError::Embedding(format!("Failed to build HTTP client: {}", e)))?;

        Ok(OpenAIEmbedder {
            client,
            api_key,
            model,
            batch_size: batch_size.min(2048),
            dimensions,
            cache,
        })
    }

    /// Build an embedder from configuration, reading the API key from the
    /// environment variable named in `embeddings.api_key_env`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = std::env::var(&config.embeddings.api_key_env).map_err(|_| {
            SitegraphError::Config(format!(
                "Environment variable {} not set. Set it in your .env file or as an environment variable.",
                config.embeddings.api_key_env
            ))
        })?;

        let cache = if config.embeddings.cache_capacity > 0 {
            Some(Arc::new(EmbeddingCache::new(
                config.embeddings.cache_capacity,
            )))
        } else {
            None
        };

        Self::new(
            api_key,
            config.embeddings.model.clone(),
            config.embeddings.batch_size,
            config.embeddings.dimensions,
            cache,
        )
    }

    /// The configured vector dimension.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed a batch of texts, splitting into API-sized requests as needed.
    /// Returns one vector per input text, in input order.
    pub async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            let embeddings = self.request(chunk.to_vec()).await?;
            all_embeddings.extend(embeddings);

            // Small delay between full batches to stay under rate limits
            if chunk.len() == self.batch_size {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }

        Ok(all_embeddings)
    }

    /// Embed a single query with caching and retry.
    pub async fn embed_query(&self, text: &str, max_retries: usize) -> Result<Vec<f32>> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(text) {
                log::debug!("Embedding cache hit for query: {}", text);
                return Ok(cached);
            }
        }

        let embedding = self.embed_with_retry(text, max_retries).await?;

        if let Some(cache) = &self.cache {
            cache.put(text.to_string(), embedding.clone());
        }

        Ok(embedding)
    }

    async fn embed_with_retry(&self, text: &str, max_retries: usize) -> Result<Vec<f32>> {
        let start = std::time::Instant::now();
        let mut attempt = 0;
        let mut delay = Duration::from_secs(1);

        loop {
            match self.request(vec![text.to_string()]).await {
                Ok(mut embeddings) => {
                    if embeddings.is_empty() {
                        return Err(SitegraphError::Embedding(
                            "Empty response from OpenAI API".to_string(),
                        ));
                    }
                    log::debug!(
                        "Embedding API call took {:?} (attempt {})",
                        start.elapsed(),
                        attempt + 1
                    );
                    return Ok(embeddings.remove(0));
                }
                Err(e) if attempt < max_retries && is_retryable(&e) => {
                    log::warn!("Retry {}/{} after error: {}", attempt + 1, max_retries, e);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One API request. Every returned vector is checked against the
    /// configured dimension; a mismatch is fatal rather than silently
    /// producing meaningless similarity scores downstream.
    async fn request(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: texts,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/embeddings")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| SitegraphError::Embedding(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(SitegraphError::Embedding(format!(
                "OpenAI API error {}: {}",
                status, body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| SitegraphError::Embedding(format!("Failed to parse response: {}", e)))?;

        let embeddings: Vec<Vec<f32>> = result.data.into_iter().map(|d| d.embedding).collect();
        for embedding in &embeddings {
            if embedding.len() != self.dimensions {
                return Err(SitegraphError::Embedding(format!(
                    "Unexpected embedding dimension: expected {}, got {}",
                    self.dimensions,
                    embedding.len()
                )));
            }
        }
        Ok(embeddings)
    }
}

/// 429 rate limits and 5xx server errors are worth retrying.
fn is_retryable(error: &SitegraphError) -> bool {
    let msg = error.to_string();
    ["429", "500", "502", "503", "504"]
        .iter()
        .any(|code| msg.contains(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedder(batch_size: usize) -> OpenAIEmbedder {
        OpenAIEmbedder::new(
            "test-key".to_string(),
            "text-embedding-3-small".to_string(),
            batch_size,
            1536,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_embedder_new() {
        let embedder = embedder(100);
        assert_eq!(embedder.model, "text-embedding-3-small");
        assert_eq!(embedder.batch_size, 100);
        assert_eq!(embedder.dimensions(), 1536);
    }

    #[test]
    fn test_batch_size_capped_at_api_limit() {
        assert_eq!(embedder(5000).batch_size, 2048);
        assert_eq!(embedder(2048).batch_size, 2048);
    }

    #[test]
    fn test_is_retryable() {
        let rate_limited =
            SitegraphError::Embedding("OpenAI API error 429 Too Many Requests: slow down".into());
        assert!(is_retryable(&rate_limited));
        let bad_key = SitegraphError::Embedding("OpenAI API error 401 Unauthorized: nope".into());
        assert!(!is_retryable(&bad_key));
    }

    #[tokio::test]
    async fn test_embed_batch_empty_input() {
        let result = embedder(10).embed_batch(Vec::new()).await.unwrap();
        assert!(result.is_empty());
    }

    // Integration tests for live API calls would require a real API key and
    // are run separately.
}
