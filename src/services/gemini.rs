//! Wire types and helpers shared by the Gemini embedding and generation clients.

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
pub(crate) struct Content<'a> {
    pub parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Part<'a> {
    pub text: &'a str,
}

impl<'a> Content<'a> {
    pub fn text(text: &'a str) -> Self {
        Self {
            parts: vec![Part { text }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Build `{api_base}/models/{model}:{method}`, accepting model names with or
/// without the `models/` prefix.
pub(crate) fn endpoint(api_base: &str, model: &str, method: &str) -> String {
    let model = model.trim().trim_start_matches("models/");
    format!("{}/models/{}:{}", api_base.trim_end_matches('/'), model, method)
}

/// HTTP client carrying the API key and a request timeout.
pub(crate) fn build_client(api_key: &str, timeout: Duration) -> Result<Client, String> {
    let mut headers = HeaderMap::new();
    let mut key: HeaderValue = api_key
        .parse()
        .map_err(|e: InvalidHeaderValue| e.to_string())?;
    key.set_sensitive(true);
    headers.insert(API_KEY_HEADER, key);

    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(|e| e.to_string())
}

/// Human-readable message from a non-success response body.
pub(crate) fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(kind) => format!("status {}: {} ({})", status, envelope.error.message, kind),
            None => format!("status {}: {}", status, envelope.error.message),
        },
        Err(_) => format!("status {}: {}", status, body),
    }
}
