//! Embedding client for turning query text into vectors.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::gemini::{self, Content};
use crate::error::EmbeddingError;
use crate::models::GeminiConfig;

/// Turns free text into a fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Request body for the `:embedContent` endpoint.
#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    content: Content<'a>,
}

/// Response from the `:embedContent` endpoint.
#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

/// Client for the Gemini embedding API.
#[derive(Debug, Clone)]
pub struct GeminiEmbedder {
    client: Client,
    url: String,
}

impl GeminiEmbedder {
    /// Create a new embedding client with the given configuration.
    pub fn new(config: &GeminiConfig) -> Result<Self, EmbeddingError> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or(EmbeddingError::MissingApiKey)?;
        let client = gemini::build_client(
            api_key,
            Duration::from_secs(config.embedding_timeout_secs),
        )
        .map_err(EmbeddingError::ConnectionError)?;

        Ok(Self {
            client,
            url: gemini::endpoint(&config.api_base, &config.embedding_model, "embedContent"),
        })
    }

    /// Get the endpoint this client posts to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = EmbedContentRequest {
            content: Content::text(text),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError(gemini::error_message(
                status, &body,
            )));
        }

        let embed_response: EmbedContentResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                EmbeddingError::Timeout
            } else {
                EmbeddingError::InvalidResponse(e.to_string())
            }
        })?;

        let values = embed_response.embedding.values;
        if values.is_empty() {
            return Err(EmbeddingError::InvalidResponse(
                "empty embedding response".to_string(),
            ));
        }

        tracing::debug!(dimension = values.len(), "query embedded");
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_api_key() {
        let config = GeminiConfig::default();
        let err = GeminiEmbedder::new(&config).unwrap_err();
        assert!(matches!(err, EmbeddingError::MissingApiKey));
    }

    #[test]
    fn test_client_creation() {
        let config = GeminiConfig {
            api_key: Some("test-key".to_string()),
            api_base: "http://localhost:8089/v1beta/".to_string(),
            ..Default::default()
        };
        let client = GeminiEmbedder::new(&config).unwrap();
        assert_eq!(
            client.url(),
            "http://localhost:8089/v1beta/models/text-embedding-004:embedContent"
        );
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"embedding": {"values": [0.25, -0.5, 1.0]}}"#;
        let parsed: EmbedContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.embedding.values, vec![0.25, -0.5, 1.0]);
    }
}
