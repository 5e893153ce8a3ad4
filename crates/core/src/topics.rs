//! Topic deduplication by word overlap.
//!
//! Topics come from independent per-page generation calls, so the same
//! concept shows up with different wording ("Network Security Basics",
//! "Basics of Network Security"). Two topics are duplicates when the Jaccard
//! index of their word sets reaches the similarity threshold.
//!
//! The scan compares every candidate with every kept topic, which is fine
//! for the tens of topics a document yields.

use crate::config::DeckConfig;
use crate::normalize::TextNormalizer;
use std::collections::HashSet;

/// Normalize a string for comparison purposes.
///
/// Converts to lowercase, removes punctuation, and collapses whitespace.
pub fn normalize_for_comparison(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Jaccard index of the word sets of two normalized strings.
///
/// Returns a score from 0.0 (no shared words) to 1.0 (same word set).
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();

    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let intersection = words_a.intersection(&words_b).count() as f64;
    let union = words_a.union(&words_b).count() as f64;

    intersection / union
}

/// Removes near-duplicate topics, keeping the first occurrence.
#[derive(Debug, Clone)]
pub struct TopicDeduplicator {
    threshold: f64,
    min_length: usize,
}

impl Default for TopicDeduplicator {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            min_length: 5,
        }
    }
}

impl TopicDeduplicator {
    /// Create a deduplicator with the default 0.7 threshold.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a deduplicator from the configured threshold and minimum length.
    pub fn from_config(config: &DeckConfig) -> Self {
        Self {
            threshold: config.similarity_threshold,
            min_length: config.min_topic_length,
        }
    }

    /// Set the Jaccard index at or above which topics are duplicates.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Whether two topics count as the same subject.
    pub fn are_similar(&self, a: &str, b: &str) -> bool {
        jaccard_similarity(&normalize_for_comparison(a), &normalize_for_comparison(b))
            >= self.threshold
    }

    /// Deduplicate topics in order.
    ///
    /// Each topic is cleaned first. A topic is kept when its comparison form
    /// is longer than the minimum length and it is not similar to any topic
    /// already kept.
    pub fn dedupe<S: AsRef<str>>(&self, topics: &[S]) -> Vec<String> {
        let mut kept: Vec<(String, String)> = Vec::new();

        for topic in topics {
            let cleaned = TextNormalizer.normalize(topic.as_ref());
            let comparable = normalize_for_comparison(&cleaned);

            if comparable.chars().count() <= self.min_length {
                log::debug!("Dropping short topic: {:?}", cleaned);
                continue;
            }

            let duplicate = kept
                .iter()
                .any(|(_, existing)| jaccard_similarity(&comparable, existing) >= self.threshold);
            if duplicate {
                log::debug!("Dropping duplicate topic: {:?}", cleaned);
                continue;
            }

            kept.push((cleaned, comparable));
        }

        kept.into_iter().map(|(topic, _)| topic).collect()
    }
}
