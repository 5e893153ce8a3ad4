//! Subject-area detection from a handful of topics.

use crate::topics::normalize_for_comparison;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// How many leading topics are inspected.
const SAMPLE_SIZE: usize = 5;

/// Broad academic area of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectArea {
    ComputerScience,
    Biology,
    Chemistry,
    Physics,
    Mathematics,
    History,
    Economics,
    Psychology,
    /// Fallback when no keyword matches.
    GeneralAcademic,
}

impl SubjectArea {
    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ComputerScience => "Computer Science",
            Self::Biology => "Biology",
            Self::Chemistry => "Chemistry",
            Self::Physics => "Physics",
            Self::Mathematics => "Mathematics",
            Self::History => "History",
            Self::Economics => "Economics",
            Self::Psychology => "Psychology",
            Self::GeneralAcademic => "General Academic",
        }
    }

    /// Whether this is the no-match fallback.
    pub fn is_general(&self) -> bool {
        matches!(self, Self::GeneralAcademic)
    }

    /// Lowercase, underscore-separated form for file names.
    pub fn slug(&self) -> String {
        self.label().to_lowercase().replace(' ', "_")
    }
}

impl fmt::Display for SubjectArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Keyword tables, checked in order; the first hit wins.
const SUBJECT_KEYWORDS: &[(SubjectArea, &[&str])] = &[
    (
        SubjectArea::ComputerScience,
        &[
            "network", "algorithm", "programming", "database", "software", "computer",
            "data structure", "coding",
        ],
    ),
    (
        SubjectArea::Biology,
        &[
            "cell", "organism", "dna", "protein", "evolution", "photosynthesis", "genetics",
            "anatomy",
        ],
    ),
    (
        SubjectArea::Chemistry,
        &["molecule", "atom", "reaction", "compound", "element", "bond", "acid", "base"],
    ),
    (
        SubjectArea::Physics,
        &[
            "force", "energy", "wave", "particle", "quantum", "motion", "electricity",
            "magnetism",
        ],
    ),
    (
        SubjectArea::Mathematics,
        &[
            "equation", "theorem", "calculus", "algebra", "geometry", "probability",
            "statistics",
        ],
    ),
    (
        SubjectArea::History,
        &[
            "war", "empire", "revolution", "century", "ancient", "medieval", "dynasty",
            "civilization",
        ],
    ),
    (
        SubjectArea::Economics,
        &["market", "economy", "trade", "finance", "money", "supply", "demand", "economic"],
    ),
    (
        SubjectArea::Psychology,
        &["behavior", "cognitive", "mental", "brain", "psychology", "social", "personality"],
    ),
];

/// Whether some token starts with the keyword word, so inflections such as
/// "cellular" or "evolutionary" count while "hardware" does not match "war".
fn has_word(tokens: &HashSet<String>, word: &str) -> bool {
    tokens.iter().any(|token| token.starts_with(word))
}

/// Classify a token set; multi-word keywords need every word present.
pub fn classify_tokens(tokens: &HashSet<String>) -> SubjectArea {
    SUBJECT_KEYWORDS
        .iter()
        .find(|(_, keywords)| {
            keywords
                .iter()
                .any(|kw| kw.split_whitespace().all(|word| has_word(tokens, word)))
        })
        .map(|(area, _)| *area)
        .unwrap_or(SubjectArea::GeneralAcademic)
}

/// Detect the subject area from the first few topics.
pub fn classify_subject<S: AsRef<str>>(topics: &[S]) -> SubjectArea {
    let tokens: HashSet<String> = topics
        .iter()
        .take(SAMPLE_SIZE)
        .flat_map(|t| {
            normalize_for_comparison(t.as_ref())
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();

    classify_tokens(&tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_computer_science() {
        let topics = ["Network Security Basics", "Firewall Configuration"];
        assert_eq!(classify_subject(&topics), SubjectArea::ComputerScience);
    }

    #[test]
    fn test_classify_biology_plural() {
        let topics = ["Plant Cells and Organelles", "Mitochondria"];
        assert_eq!(classify_subject(&topics), SubjectArea::Biology);
    }

    #[test]
    fn test_multi_word_keyword() {
        let topics = ["Choosing a Data Structure"];
        assert_eq!(classify_subject(&topics), SubjectArea::ComputerScience);
        // "data" alone is not enough
        let topics = ["Data Collection Ethics"];
        assert_eq!(classify_subject(&topics), SubjectArea::GeneralAcademic);
    }

    #[test]
    fn test_table_order_wins() {
        // "algorithm" (computer science) and "quantum" (physics) both match
        let topics = ["Quantum Algorithms"];
        assert_eq!(classify_subject(&topics), SubjectArea::ComputerScience);
    }

    #[test]
    fn test_inflected_keywords() {
        assert_eq!(classify_subject(&["Cellular Respiration"]), SubjectArea::Biology);
        assert_eq!(
            classify_subject(&["Algorithmic Complexity"]),
            SubjectArea::ComputerScience
        );
        assert_eq!(classify_subject(&["Evolutionary Biology"]), SubjectArea::Biology);
        assert_eq!(classify_subject(&["Warfare in Antiquity"]), SubjectArea::History);
    }

    #[test]
    fn test_whole_words_only() {
        // "hardware" contains "war" but does not start with it
        let topics = ["Hardware Procurement Policies"];
        assert_eq!(classify_subject(&topics), SubjectArea::GeneralAcademic);
    }

    #[test]
    fn test_only_first_five_topics_count() {
        let topics = [
            "Renaissance Art",
            "Baroque Music",
            "Gothic Architecture",
            "Romantic Poetry",
            "Modernist Novels",
            "Supply and Demand",
        ];
        assert_eq!(classify_subject(&topics), SubjectArea::GeneralAcademic);
    }

    #[test]
    fn test_empty_is_general() {
        let topics: [&str; 0] = [];
        assert_eq!(classify_subject(&topics), SubjectArea::GeneralAcademic);
    }

    #[test]
    fn test_labels_and_slug() {
        assert_eq!(SubjectArea::ComputerScience.label(), "Computer Science");
        assert_eq!(SubjectArea::ComputerScience.slug(), "computer_science");
        assert_eq!(SubjectArea::GeneralAcademic.to_string(), "General Academic");
        assert!(SubjectArea::GeneralAcademic.is_general());
    }
}
