//! Core types and text processing for turning documents into slide decks.
//!
//! Cleaning, bullet sizing, topic deduplication, subject detection, content
//! distribution and rendering live here, along with the [`ContentPipeline`]
//! that drives them. I/O-bound collaborators (page extraction, the generation
//! service, the presentation file writer) are plugged in through the
//! [`PageSource`], [`TextGenerator`] and [`DeckWriter`] traits.

pub mod bullets;
pub mod config;
pub mod distribute;
pub mod error;
pub mod format;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
pub mod render;
pub mod subject;
pub mod topics;
pub mod types;

pub use bullets::{fallback_bullet, BulletFilter, BulletSplitter};
pub use config::{DeckConfig, GenerationParams, DEFAULT_TEMPLATE, DEFAULT_TEMPLATES_DIR};
pub use distribute::{truncate_title, ContentDistributor};
pub use error::{Error, Result};
pub use format::{format_runs, RichTextFormatter};
pub use normalize::{clean_response_lines, normalize, TextNormalizer};
pub use pipeline::{
    output_file_name, ContentPipeline, GenerationRequest, LogObserver, PageSource, PipelineEvent,
    PipelineObserver, PipelineOutput, RunSummary, TextGenerator,
};
pub use render::{DeckWriter, PresentationRenderer};
pub use subject::{classify_subject, SubjectArea};
pub use topics::TopicDeduplicator;
pub use types::{
    Alignment, Deck, FormattedRun, Paragraph, PresentationSpec, RenderedSlide, RunFont, RunStyle,
    Section, SlideKind, SlideSpec,
};
