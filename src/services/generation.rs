//! Generative client for turning prompts into text.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::gemini::{self, Content};
use crate::error::GenerationError;
use crate::models::GeminiConfig;

/// Turns a prompt into generated text.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, or the reason there is none.
    fn into_text(self) -> Result<String, GenerationError> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(GenerationError::EmptyResponse(
                block_reason.unwrap_or_else(|| "no candidates".to_string()),
            ));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse(
                candidate
                    .finish_reason
                    .or(block_reason)
                    .unwrap_or_else(|| "unknown".to_string()),
            ));
        }

        Ok(text)
    }
}

/// Client for the Gemini `generateContent` API.
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    client: Client,
    url: String,
    model: String,
}

impl GeminiGenerator {
    /// Create a generator for one model.
    pub fn new(config: &GeminiConfig, model: &str) -> Result<Self, GenerationError> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingApiKey)?;
        let client = gemini::build_client(
            api_key,
            Duration::from_secs(config.generation_timeout_secs),
        )
        .map_err(GenerationError::ConnectionError)?;

        Ok(Self {
            client,
            url: gemini::endpoint(&config.api_base, model, "generateContent"),
            model: model.to_string(),
        })
    }

    /// Generator for grounded answers.
    pub fn for_answers(config: &GeminiConfig) -> Result<Self, GenerationError> {
        Self::new(config, &config.answer_model)
    }

    /// Generator for document summaries.
    pub fn for_summaries(config: &GeminiConfig) -> Result<Self, GenerationError> {
        Self::new(config, &config.summary_model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = GenerateContentRequest {
            contents: vec![Content::text(prompt)],
        };

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "generating");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else {
                    GenerationError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::ServerError(gemini::error_message(
                status, &body,
            )));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout
            } else {
                GenerationError::InvalidResponse(e.to_string())
            }
        })?;

        parsed.into_text()
    }
}
