use thiserror::Error;

/// Errors from the Gemini API.
#[derive(Error, Debug)]
pub enum GeminiError {
    /// Transport or decoding failure. The request URL is stripped.
    #[error("HTTP request error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("prompt blocked: {0}")]
    Blocked(String),

    #[error("response contained no text")]
    EmptyResponse,

    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,

    #[error("API key is not a valid header value")]
    InvalidApiKey,
}

impl From<reqwest::Error> for GeminiError {
    fn from(e: reqwest::Error) -> Self {
        GeminiError::Http(e.without_url())
    }
}

impl From<GeminiError> for deck_core::Error {
    fn from(e: GeminiError) -> Self {
        match e {
            GeminiError::MissingApiKey | GeminiError::InvalidApiKey => {
                deck_core::Error::ConfigError(e.to_string())
            }
            other => deck_core::Error::Upstream(other.to_string()),
        }
    }
}
