//! Tunable thresholds and pipeline settings.
//!
//! Every field has a default, so a TOML file only needs the keys it wants
//! to change:
//!
//! ```toml
//! max_bullets_per_slide = 4
//! similarity_threshold = 0.6
//!
//! [content_params]
//! temperature = 0.2
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Sampling parameters passed through to the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl GenerationParams {
    /// Parameters used when extracting topics from a page.
    pub fn topic_extraction() -> Self {
        Self {
            temperature: 0.3,
            top_k: 40,
            top_p: 0.8,
            max_output_tokens: 500,
        }
    }

    /// Parameters used when generating bullet content for a topic.
    pub fn content_generation() -> Self {
        Self {
            temperature: 0.4,
            top_k: 50,
            top_p: 0.9,
            max_output_tokens: 800,
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::content_generation()
    }
}

/// A possibly partial `[*_params]` table.
#[derive(Debug, Default, Deserialize)]
struct ParamsTable {
    temperature: Option<f32>,
    top_k: Option<u32>,
    top_p: Option<f32>,
    max_output_tokens: Option<u32>,
}

impl ParamsTable {
    fn over(self, base: GenerationParams) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature.unwrap_or(base.temperature),
            top_k: self.top_k.unwrap_or(base.top_k),
            top_p: self.top_p.unwrap_or(base.top_p),
            max_output_tokens: self.max_output_tokens.unwrap_or(base.max_output_tokens),
        }
    }
}

fn topic_params<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<GenerationParams, D::Error> {
    ParamsTable::deserialize(d).map(|t| t.over(GenerationParams::topic_extraction()))
}

fn content_params<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<GenerationParams, D::Error> {
    ParamsTable::deserialize(d).map(|t| t.over(GenerationParams::content_generation()))
}

pub const DEFAULT_TEMPLATES_DIR: &str = "templates";

/// Name that selects the built-in design.
pub const DEFAULT_TEMPLATE: &str = "default";

/// Configuration for the whole document-to-deck run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// Upper bound on bullets rendered on one slide.
    pub max_bullets_per_slide: usize,
    /// Character count above which a bullet is considered for splitting.
    pub comprehensive_text_threshold: usize,
    /// Word count above which a bullet is considered for splitting.
    pub split_word_threshold: usize,
    /// Maximum rendered title length, ellipsis included.
    pub max_title_length: usize,
    /// Slide count used when a presentation spec does not ask for one.
    pub target_slide_count: usize,
    /// Ceiling on the slide count the pipeline asks the renderer for.
    pub max_target_slides: usize,

    /// Jaccard index at or above which two topics are duplicates.
    pub similarity_threshold: f64,
    /// Normalized topics this short or shorter are discarded.
    pub min_topic_length: usize,

    pub min_bullet_chars: usize,
    pub max_bullet_chars: usize,
    pub min_bullet_words: usize,
    /// Word minimum for the relaxed fallback selection.
    pub fallback_bullet_words: usize,
    /// How many bullets the relaxed fallback selection keeps.
    pub fallback_bullet_take: usize,
    pub max_bullets_per_topic: usize,
    /// Topics with fewer bullets than this are dropped.
    pub min_section_bullets: usize,
    /// Filler phrases that disqualify a bullet.
    pub generic_phrases: Vec<String>,

    /// Pause between page-level generation calls, in milliseconds.
    pub page_delay_ms: u64,
    /// Pause between topic-level generation calls, in milliseconds.
    pub topic_delay_ms: u64,
    /// Model used for topic extraction.
    pub topic_model: String,
    /// Models rotated across topics for content generation.
    pub content_models: Vec<String>,
    /// Keep a topic with a placeholder bullet when its generation call fails.
    pub fallback_on_failure: bool,

    /// Missing keys fall back to [`GenerationParams::topic_extraction`].
    #[serde(deserialize_with = "topic_params")]
    pub topic_params: GenerationParams,
    /// Missing keys fall back to [`GenerationParams::content_generation`].
    #[serde(deserialize_with = "content_params")]
    pub content_params: GenerationParams,

    /// Template name looked up in `templates_dir`; `None` or `"default"`
    /// uses the built-in design.
    pub template: Option<String>,
    /// Folder holding user `.pptx` templates.
    pub templates_dir: PathBuf,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            max_bullets_per_slide: 5,
            comprehensive_text_threshold: 120,
            split_word_threshold: 20,
            max_title_length: 65,
            target_slide_count: 15,
            max_target_slides: 25,
            similarity_threshold: 0.7,
            min_topic_length: 5,
            min_bullet_chars: 50,
            max_bullet_chars: 200,
            min_bullet_words: 8,
            fallback_bullet_words: 5,
            fallback_bullet_take: 6,
            max_bullets_per_topic: 8,
            min_section_bullets: 3,
            generic_phrases: vec![
                "very important".to_string(),
                "quite useful".to_string(),
                "extremely helpful".to_string(),
                "it is noted that".to_string(),
            ],
            page_delay_ms: 2000,
            topic_delay_ms: 3000,
            topic_model: "gemini-2.0-flash-exp".to_string(),
            content_models: vec![
                "gemini-2.0-flash".to_string(),
                "gemini-1.5-flash".to_string(),
                "gemini-1.5-pro".to_string(),
                "gemini-2.0-flash".to_string(),
            ],
            fallback_on_failure: false,
            topic_params: GenerationParams::topic_extraction(),
            content_params: GenerationParams::content_generation(),
            template: None,
            templates_dir: PathBuf::from(DEFAULT_TEMPLATES_DIR),
        }
    }
}

impl DeckConfig {
    /// Create a configuration with every default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML text; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::ConfigError(e.to_string()))
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Disable the inter-call pauses (useful for tests and offline runs).
    pub fn without_delays(mut self) -> Self {
        self.page_delay_ms = 0;
        self.topic_delay_ms = 0;
        self
    }

    /// The selected user template, if any. `"default"` and blank names count
    /// as no template.
    pub fn template_name(&self) -> Option<&str> {
        self.template
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty() && *name != DEFAULT_TEMPLATE)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn topic_delay(&self) -> Duration {
        Duration::from_millis(self.topic_delay_ms)
    }
}
