//! Rich-text run splitting for markdown-style emphasis.
//!
//! Generated bullets often carry `**bold**` and `*italic*` markers. These are
//! turned into styled runs with the markers removed.

use crate::normalize::TextNormalizer;
use crate::types::{FormattedRun, RunFont, RunStyle};
use regex::Regex;
use std::sync::LazyLock;

/// `__text__` is treated as bold.
static UNDERSCORE_BOLD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__\s*([^_]+?)\s*__").unwrap());

/// `~~text~~` strikethrough is dropped, text kept.
static STRIKETHROUGH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~~\s*([^~]+?)\s*~~").unwrap());

/// Tightens `** text **` to `**text**`.
static BOLD_TRIM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*\s*([^*]+?)\s*\*\*").unwrap());

static BOLD_SPAN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*[^*]+?\*\*").unwrap());

static ITALIC_SPAN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*[^*]+?\*").unwrap());

/// Rewrite the markdown variants we accept into `**`/`*` markers.
fn normalize_markdown(text: &str) -> String {
    let text = UNDERSCORE_BOLD_REGEX.replace_all(text, "**$1**");
    let text = STRIKETHROUGH_REGEX.replace_all(&text, "$1");
    BOLD_TRIM_REGEX.replace_all(&text, "**$1**").into_owned()
}

/// Splits cleaned text into bold, italic and plain runs.
#[derive(Debug, Clone, Default)]
pub struct RichTextFormatter {
    font: RunFont,
}

impl RichTextFormatter {
    /// Create a formatter using the default content font.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the font applied to every produced run.
    pub fn with_font(mut self, font: RunFont) -> Self {
        self.font = font;
        self
    }

    /// Split text into styled runs.
    ///
    /// Bold spans are split out first; the text between them is then split
    /// on italic spans. If nothing non-blank is produced, the untouched input
    /// is returned as a single plain run so no content is lost.
    pub fn format_runs(&self, text: &str) -> Vec<FormattedRun> {
        let cleaned = normalize_markdown(&TextNormalizer.normalize(text));
        let mut runs = Vec::new();
        let mut last = 0;

        for m in BOLD_SPAN_REGEX.find_iter(&cleaned) {
            self.push_non_bold(&cleaned[last..m.start()], &mut runs);
            let span = m.as_str();
            self.push_run(&span[2..span.len() - 2], RunStyle::BOLD, &mut runs);
            last = m.end();
        }
        self.push_non_bold(&cleaned[last..], &mut runs);

        if runs.iter().all(|run| run.text.trim().is_empty()) {
            return vec![FormattedRun::plain(text).with_font(self.font.clone())];
        }

        runs
    }

    /// Split a span that holds no bold markers on its italic spans.
    fn push_non_bold(&self, segment: &str, runs: &mut Vec<FormattedRun>) {
        let mut plain_start = 0;
        let mut cursor = 0;

        while let Some(m) = ITALIC_SPAN_REGEX.find_at(segment, cursor) {
            // A star touching the span means it belongs to a stray `**`
            let adjacent =
                segment[..m.start()].ends_with('*') || segment[m.end()..].starts_with('*');
            if adjacent {
                cursor = m.start() + 1;
                continue;
            }

            self.push_run(&segment[plain_start..m.start()], RunStyle::PLAIN, runs);
            let span = m.as_str();
            self.push_run(span[1..span.len() - 1].trim(), RunStyle::ITALIC, runs);
            plain_start = m.end();
            cursor = m.end();
        }

        self.push_run(&segment[plain_start..], RunStyle::PLAIN, runs);
    }

    fn push_run(&self, text: &str, style: RunStyle, runs: &mut Vec<FormattedRun>) {
        if text.is_empty() {
            return;
        }
        runs.push(FormattedRun::new(text, style).with_font(self.font.clone()));
    }
}

/// Convenience wrapper around [`RichTextFormatter::format_runs`].
pub fn format_runs(text: &str) -> Vec<FormattedRun> {
    RichTextFormatter::new().format_runs(text)
}
