//! Error types for slide deck generation.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning a document into a slide deck.
///
/// Nothing in the cleaning and distribution components returns an error;
/// these cover the I/O-bound collaborators and the terminal pipeline states.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The source PDF could not be turned into page text.
    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    /// The generative-text service call failed.
    #[error("Generation service error: {0}")]
    Upstream(String),

    /// No page of the source produced a single topic.
    #[error("No topics found in the source document")]
    NoTopics,

    /// Every topic was dropped; there is nothing to render.
    #[error("No usable sections were generated")]
    NoUsableSections,

    /// A presentation template could not be used.
    #[error("Template error: {0}")]
    TemplateError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML writing or parsing error (for PPTX).
    #[error("XML error: {0}")]
    XmlError(String),
}
