//! Bullet sizing, splitting and quality filtering.

use crate::config::DeckConfig;
use regex::Regex;
use std::sync::LazyLock;

/// Bullets at or under this length are never split.
const SPLIT_MIN_CHARS: usize = 250;

/// Cap for a group of regrouped sentences.
const SENTENCE_GROUP_CHARS: usize = 200;

/// Clause splitting is only attempted above this length.
const CLAUSE_SPLIT_MIN_CHARS: usize = 300;

/// Cap for a group of regrouped clauses.
const CLAUSE_GROUP_CHARS: usize = 180;

static SENTENCE_BOUNDARY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").unwrap());

static CLAUSE_BOUNDARY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;]\s+").unwrap());

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split after each boundary match, keeping the punctuation with the piece
/// before it and dropping the whitespace.
fn split_after<'a>(text: &'a str, boundary: &Regex) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for m in boundary.find_iter(text) {
        // Boundary punctuation is a single ASCII byte
        pieces.push(&text[start..m.start() + 1]);
        start = m.end();
    }
    pieces.push(&text[start..]);
    pieces
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Greedily pack pieces into space-joined groups no longer than `cap`.
/// A single piece longer than `cap` becomes a group of its own.
fn regroup(pieces: &[&str], cap: usize) -> Vec<String> {
    let mut groups = Vec::new();
    let mut current = String::new();

    for piece in pieces {
        if current.is_empty() {
            current.push_str(piece);
        } else if char_len(&current) + 1 + char_len(piece) <= cap {
            current.push(' ');
            current.push_str(piece);
        } else {
            groups.push(std::mem::take(&mut current));
            current.push_str(piece);
        }
    }

    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

/// Decides when a bullet is too long and splits it conservatively.
#[derive(Debug, Clone)]
pub struct BulletSplitter {
    char_threshold: usize,
    word_threshold: usize,
}

impl Default for BulletSplitter {
    fn default() -> Self {
        Self {
            char_threshold: 120,
            word_threshold: 20,
        }
    }
}

impl BulletSplitter {
    /// Create a splitter with the default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a splitter from the configured thresholds.
    pub fn from_config(config: &DeckConfig) -> Self {
        Self {
            char_threshold: config.comprehensive_text_threshold,
            word_threshold: config.split_word_threshold,
        }
    }

    /// Set the character count above which a bullet needs splitting.
    pub fn with_char_threshold(mut self, chars: usize) -> Self {
        self.char_threshold = chars;
        self
    }

    /// Set the word count above which a bullet needs splitting.
    pub fn with_word_threshold(mut self, words: usize) -> Self {
        self.word_threshold = words;
        self
    }

    /// Whether a cleaned bullet is long enough to be considered for splitting.
    pub fn needs_split(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        char_len(text) > self.char_threshold || text.split_whitespace().count() > self.word_threshold
    }

    /// Split a cleaned bullet into slide-sized pieces.
    ///
    /// Text up to 250 characters is returned whole. Longer text is split at
    /// sentence boundaries and regrouped into chunks of at most 200
    /// characters. Without sentence boundaries, text over 300 characters is
    /// split at clause boundaries into chunks of at most 180 characters.
    /// Anything else is returned whole. Never returns an empty vector.
    pub fn split(&self, text: &str) -> Vec<String> {
        if char_len(text) <= SPLIT_MIN_CHARS {
            return vec![text.to_string()];
        }

        let sentences = split_after(text, &SENTENCE_BOUNDARY_REGEX);
        if sentences.len() > 1 {
            return regroup(&sentences, SENTENCE_GROUP_CHARS);
        }

        if char_len(text) > CLAUSE_SPLIT_MIN_CHARS {
            let clauses = split_after(text, &CLAUSE_BOUNDARY_REGEX);
            if clauses.len() > 1 {
                return regroup(&clauses, CLAUSE_GROUP_CHARS);
            }
        }

        vec![text.to_string()]
    }
}

/// Selects quality bullets from cleaned generation output.
#[derive(Debug, Clone)]
pub struct BulletFilter {
    min_chars: usize,
    max_chars: usize,
    min_words: usize,
    fallback_words: usize,
    fallback_take: usize,
    min_accepted: usize,
    max_bullets: usize,
    generic_phrases: Vec<String>,
}

impl Default for BulletFilter {
    fn default() -> Self {
        Self::from_config(&DeckConfig::default())
    }
}

impl BulletFilter {
    /// Create a filter from the configured quality thresholds.
    pub fn from_config(config: &DeckConfig) -> Self {
        Self {
            min_chars: config.min_bullet_chars,
            max_chars: config.max_bullet_chars,
            min_words: config.min_bullet_words,
            fallback_words: config.fallback_bullet_words,
            fallback_take: config.fallback_bullet_take,
            min_accepted: config.min_section_bullets,
            max_bullets: config.max_bullets_per_topic,
            generic_phrases: config
                .generic_phrases
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
        }
    }

    /// Whether a single line meets the length, word and phrase rules.
    pub fn is_quality(&self, line: &str) -> bool {
        let len = char_len(line);
        if len < self.min_chars || len > self.max_chars {
            return false;
        }

        let lower = line.to_lowercase();
        if self.generic_phrases.iter().any(|p| lower.contains(p.as_str())) {
            return false;
        }

        line.split_whitespace().count() >= self.min_words
    }

    /// Pick the bullets to keep for one topic.
    ///
    /// When too few lines pass the quality rules, the first few lines with a
    /// reasonable word count are taken instead.
    pub fn select(&self, lines: &[String]) -> Vec<String> {
        let mut selected: Vec<String> = lines
            .iter()
            .filter(|line| self.is_quality(line))
            .cloned()
            .collect();

        if selected.len() < self.min_accepted {
            log::debug!(
                "Only {} quality bullets, relaxing to {}+ words",
                selected.len(),
                self.fallback_words
            );
            selected = lines
                .iter()
                .filter(|line| line.split_whitespace().count() >= self.fallback_words)
                .take(self.fallback_take)
                .cloned()
                .collect();
        }

        selected.truncate(self.max_bullets);
        selected
    }
}

/// Placeholder bullet used when a topic's generation call fails.
pub fn fallback_bullet(topic: &str) -> String {
    format!(
        "Detailed information and key concepts related to {} will be covered in this section",
        topic
    )
}
