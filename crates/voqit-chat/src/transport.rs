//! Remote completion transport.
//!
//! `GeminiTransport` speaks the generative-language `generateContent` API:
//! the question goes out as a single text part and the answer is the first
//! candidate's first text part.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use voqit_core::config::CompletionConfig;

use crate::error::TransportError;

/// One outbound completion call. Implementations never retry.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, TransportError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|t| !t.is_empty())
    }
}

#[derive(Clone)]
pub struct GeminiTransport {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiTransport")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiTransport {
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn from_config(config: &CompletionConfig, api_key: &str) -> Self {
        Self::new(&config.base_url, &config.model, api_key)
    }

    /// Full `generateContent` URL, without the key query parameter.
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl CompletionTransport for GeminiTransport {
    async fn generate(&self, prompt: &str) -> Result<String, TransportError> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TransportError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;

        parsed.first_text().ok_or_else(|| {
            TransportError::MalformedResponse("response has no candidate text".to_string())
        })
    }
}
