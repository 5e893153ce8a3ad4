//! Text normalization for generated and extracted text.
//!
//! Decodes HTML entities, drops stray backslash escapes, strips markup tags,
//! and collapses whitespace. Also cleans raw generation responses into
//! individual candidate lines.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Matches named and numeric character references.
static ENTITY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").unwrap());

/// Backslash before punctuation or a markdown marker.
static ESCAPE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\\([.,;:!?()\[\]{}*_\-"'])"#).unwrap());

/// `<span ...>content</span>`, content kept.
static SPAN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<span[^>]*>(.*?)</span>").unwrap());

/// Common block and inline formatting tags.
static FORMAT_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:div|p|br|strong|em|b|i|u|font)\b[^>]*>").unwrap()
});

/// Anything else that looks like a tag.
static ANY_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Leading bullet glyphs or ordinal markers on a response line.
static LINE_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:•\s*|[\-*]+\s+|\d+[.)]\s+)").unwrap());

/// Leading "Topic:"-style labels.
static LINE_LABEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:topic|subject|chapter|section|point)\s*:\s*").unwrap()
});

static TRAILING_PUNCT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[:.;,]+$").unwrap());

static EMPTY_BRACKETS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*\)|\[\s*\]").unwrap());

/// Upper bound on normalization passes; real input settles in one or two.
const MAX_PASSES: usize = 8;

/// Resolve a single character reference body (without `&` and `;`).
fn decode_entity(body: &str) -> Option<String> {
    if let Some(num) = body.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(|c| c.to_string());
    }

    let decoded = match body {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "nbsp" => " ",
        "quot" => "\"",
        "apos" => "'",
        "hellip" => "…",
        "mdash" => "—",
        "ndash" => "–",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201C}",
        "rdquo" => "\u{201D}",
        "copy" => "©",
        "reg" => "®",
        "trade" => "™",
        _ => return None,
    };
    Some(decoded.to_string())
}

/// Decode entities until none are left, so double-encoded text
/// (`&amp;lt;`) resolves fully.
fn decode_entities(text: &str) -> String {
    let mut current = text.to_string();
    for _ in 0..MAX_PASSES {
        let next = ENTITY_REGEX
            .replace_all(&current, |caps: &Captures| {
                decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn strip_escapes(text: &str) -> String {
    ESCAPE_REGEX.replace_all(text, "$1").into_owned()
}

fn strip_tags(text: &str) -> String {
    let text = SPAN_REGEX.replace_all(text, "$1");
    let text = FORMAT_TAG_REGEX.replace_all(&text, "");
    ANY_TAG_REGEX.replace_all(&text, "").into_owned()
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text, " ").trim().to_string()
}

/// Normalizer for untrusted generated or extracted text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    /// Create a new text normalizer.
    pub fn new() -> Self {
        Self
    }

    /// Normalize raw text into clean, single-spaced text.
    ///
    /// Steps run in a fixed order: entity decoding, escape removal, tag
    /// stripping, whitespace collapse. The sequence is repeated until the
    /// text stops changing, so the result is stable under re-normalization.
    pub fn normalize(&self, text: &str) -> String {
        let mut current = text.to_string();
        for _ in 0..MAX_PASSES {
            let next = self.normalize_once(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// Normalize optional input; absent text becomes an empty string.
    pub fn normalize_opt(&self, text: Option<&str>) -> String {
        text.map(|t| self.normalize(t)).unwrap_or_default()
    }

    fn normalize_once(&self, text: &str) -> String {
        let text = decode_entities(text);
        let text = strip_escapes(&text);
        let text = strip_tags(&text);
        collapse_whitespace(&text)
    }
}

/// Convenience wrapper around [`TextNormalizer::normalize`].
pub fn normalize(text: &str) -> String {
    TextNormalizer.normalize(text)
}

/// Split a raw generation response into cleaned candidate lines.
///
/// Strips list markers, "Topic:"-style labels, trailing punctuation and
/// empty brackets. Lines of three characters or fewer are dropped.
pub fn clean_response_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let line = LINE_MARKER_REGEX.replace(line, "");
            let line = LINE_LABEL_REGEX.replace(&line, "");
            let line = TRAILING_PUNCT_REGEX.replace(&line, "");
            let line = EMPTY_BRACKETS_REGEX.replace_all(&line, "");
            let line = WHITESPACE_REGEX.replace_all(&line, " ");
            let line = line.trim();

            (line.chars().count() > 3).then(|| line.to_string())
        })
        .collect()
}
