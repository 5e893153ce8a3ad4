//! Distribution of section bullets across size-bounded slides.
//!
//! Bullets are cleaned and, when too long, split; the result is chunked into
//! groups of at most `max_bullets_per_slide`, with "(Part i/n)" appended to
//! the title when a section needs more than one slide.

use crate::bullets::BulletSplitter;
use crate::config::DeckConfig;
use crate::normalize::TextNormalizer;
use crate::types::SlideSpec;

/// Default cap on bullets per slide.
pub const MAX_BULLETS_PER_SLIDE: usize = 5;

/// Default cap on rendered title length.
pub const MAX_TITLE_LENGTH: usize = 65;

const ELLIPSIS: &str = "...";

/// Packs a section's bullets into slides.
#[derive(Debug, Clone)]
pub struct ContentDistributor {
    /// Upper bound on bullets per slide.
    max_bullets_per_slide: usize,
    splitter: BulletSplitter,
}

impl Default for ContentDistributor {
    fn default() -> Self {
        Self {
            max_bullets_per_slide: MAX_BULLETS_PER_SLIDE,
            splitter: BulletSplitter::default(),
        }
    }
}

impl ContentDistributor {
    /// Create a distributor with the default 5 bullets per slide.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a distributor from the configured limits.
    pub fn from_config(config: &DeckConfig) -> Self {
        Self {
            max_bullets_per_slide: config.max_bullets_per_slide.max(1),
            splitter: BulletSplitter::from_config(config),
        }
    }

    /// Set the maximum number of bullets per slide.
    pub fn with_max_bullets_per_slide(mut self, bullets: usize) -> Self {
        self.max_bullets_per_slide = bullets.max(1); // At least 1 bullet per slide
        self
    }

    /// Replace the splitter used for long bullets.
    pub fn with_splitter(mut self, splitter: BulletSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    /// Largest number of bullets placed on one slide (never below 1).
    pub fn max_bullets_per_slide(&self) -> usize {
        self.max_bullets_per_slide
    }

    /// Clean each bullet, drop empties and split the long ones.
    pub fn prepare_bullets<S: AsRef<str>>(&self, bullets: &[S]) -> Vec<String> {
        let normalizer = TextNormalizer::new();
        let mut processed = Vec::with_capacity(bullets.len());

        for bullet in bullets {
            let cleaned = normalizer.normalize(bullet.as_ref());
            if cleaned.is_empty() {
                continue;
            }

            if self.splitter.needs_split(&cleaned) {
                processed.extend(
                    self.splitter
                        .split(&cleaned)
                        .into_iter()
                        .filter(|piece| !piece.is_empty()),
                );
            } else {
                processed.push(cleaned);
            }
        }

        processed
    }

    /// Bullets per slide for a given bullet total and optional slide budget.
    pub fn points_per_slide(&self, total_bullets: usize, max_slides: Option<usize>) -> usize {
        match max_slides {
            Some(slides) if slides > 0 => total_bullets
                .div_ceil(slides)
                .min(self.max_bullets_per_slide)
                .max(1),
            _ => self.max_bullets_per_slide,
        }
    }

    /// Distribute a section's bullets over one or more slides.
    ///
    /// With a slide budget, bullets are spread evenly over that many slides
    /// where the per-slide cap allows it. Every processed bullet lands on
    /// exactly one slide. A section with no usable bullets still yields one
    /// slide with an empty body.
    pub fn distribute<S: AsRef<str>>(
        &self,
        title: &str,
        bullets: &[S],
        max_slides: Option<usize>,
    ) -> Vec<SlideSpec> {
        let processed = self.prepare_bullets(bullets);
        if processed.is_empty() {
            return vec![SlideSpec::new(title, Vec::new())];
        }

        let per_slide = self.points_per_slide(processed.len(), max_slides);
        let total_parts = processed.len().div_ceil(per_slide);

        processed
            .chunks(per_slide)
            .enumerate()
            .map(|(idx, chunk)| {
                let slide_title = if total_parts > 1 {
                    format!("{} (Part {}/{})", title, idx + 1, total_parts)
                } else {
                    title.to_string()
                };
                SlideSpec::new(slide_title, chunk.to_vec())
            })
            .collect()
    }
}

/// Shorten a title to `max_len` characters at a word boundary.
///
/// Whole words are kept while they fit in `max_len - 3` characters, then
/// "..." is appended. A first word that is already too long is hard-cut.
pub fn truncate_title(title: &str, max_len: usize) -> String {
    let title = TextNormalizer.normalize(title);
    if title.chars().count() <= max_len {
        return title;
    }

    let limit = max_len.saturating_sub(ELLIPSIS.len());
    let mut truncated = String::new();

    for word in title.split_whitespace() {
        let extra = if truncated.is_empty() { 0 } else { 1 };
        if truncated.chars().count() + extra + word.chars().count() > limit {
            break;
        }
        if extra == 1 {
            truncated.push(' ');
        }
        truncated.push_str(word);
    }

    if truncated.is_empty() {
        truncated = title.chars().take(limit).collect();
    }

    truncated.push_str(ELLIPSIS);
    truncated
}
