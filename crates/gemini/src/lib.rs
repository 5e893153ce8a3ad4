//! Blocking client for the Gemini `generateContent` endpoint.
//!
//! Implements [`deck_core::TextGenerator`]. Each call is a single request;
//! failures are returned to the caller as-is.

pub mod api;
pub mod error;

pub use error::GeminiError;

use api::{GenerateRequest, GenerateResponse};
use deck_core::{GenerationRequest, TextGenerator};
use reqwest::header::HeaderValue;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Header carrying the API key. The key never appears in the URL.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, GeminiError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("deck-gemini/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Create a client with the key from `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self, GeminiError> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Self::new(key.trim()),
            _ => Err(GeminiError::MissingApiKey),
        }
    }

    /// Point the client at another API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `generateContent` URL for a model, without the key.
    pub fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }

    fn build_request(
        &self,
        model: &str,
        body: &GenerateRequest,
    ) -> Result<reqwest::blocking::Request, GeminiError> {
        let mut key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| GeminiError::InvalidApiKey)?;
        key.set_sensitive(true);

        Ok(self
            .client
            .post(self.endpoint(model))
            .header(API_KEY_HEADER, key)
            .timeout(self.timeout)
            .json(body)
            .build()?)
    }

    /// Send one prompt and return the first candidate's text.
    pub fn generate_text(
        &self,
        model: &str,
        prompt: &str,
        params: &deck_core::GenerationParams,
    ) -> Result<String, GeminiError> {
        let body = GenerateRequest::new(prompt, params);
        log::debug!("generateContent model={} prompt_chars={}", model, prompt.len());

        let request = self.build_request(model, &body)?;
        let resp = self.client.execute(request)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(GeminiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: GenerateResponse = resp.json()?;
        extract_text(&data)
    }
}

fn extract_text(data: &GenerateResponse) -> Result<String, GeminiError> {
    if let Some(text) = data.text() {
        return Ok(text);
    }
    match data.block_reason() {
        Some(reason) => Err(GeminiError::Blocked(reason.to_string())),
        None => Err(GeminiError::EmptyResponse),
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, request: &GenerationRequest) -> deck_core::Result<String> {
        Ok(self.generate_text(&request.model, &request.prompt, &request.params)?)
    }
}
