//! Rendering of a presentation spec into a laid-out deck.
//!
//! The renderer decides which slides exist and what text and styling each
//! one carries. Writing the deck to a file is left to a [`DeckWriter`].

use crate::config::DeckConfig;
use crate::distribute::{truncate_title, ContentDistributor};
use crate::error::Result;
use crate::format::RichTextFormatter;
use crate::normalize::TextNormalizer;
use crate::types::{
    Alignment, Deck, FormattedRun, Paragraph, PresentationSpec, RenderedSlide, RunFont,
    SlideKind, SlideSpec,
};
use std::path::{Path, PathBuf};

pub const TITLE_FONT_SIZE: u32 = 44;
pub const SUBTITLE_FONT_SIZE: u32 = 24;
pub const SECTION_TITLE_FONT_SIZE: u32 = 36;
pub const CLOSING_TITLE_FONT_SIZE: u32 = 52;
pub const CLOSING_BODY_FONT_SIZE: u32 = 28;

/// Title of the closing slide.
pub const CLOSING_TITLE: &str = "Thank You";

/// Bullets this short or shorter are not rendered.
const MIN_RENDERED_BULLET_CHARS: usize = 10;

/// Persists a rendered deck.
pub trait DeckWriter {
    /// Write the deck to `path`, returning the path actually written.
    fn save(&self, deck: &Deck, path: &Path) -> Result<PathBuf>;
}

/// Turns a [`PresentationSpec`] into a [`Deck`].
#[derive(Debug, Clone)]
pub struct PresentationRenderer {
    distributor: ContentDistributor,
    formatter: RichTextFormatter,
    max_title_length: usize,
    default_target_slides: usize,
}

impl Default for PresentationRenderer {
    fn default() -> Self {
        Self::from_config(&DeckConfig::default())
    }
}

impl PresentationRenderer {
    /// Create a renderer with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a renderer from the configured limits.
    pub fn from_config(config: &DeckConfig) -> Self {
        Self {
            distributor: ContentDistributor::from_config(config),
            formatter: RichTextFormatter::new(),
            max_title_length: config.max_title_length.max(4),
            default_target_slides: config.target_slide_count.max(1),
        }
    }

    /// Render the whole deck: a title slide, the section slides, and a
    /// closing slide.
    ///
    /// The slide budget (less title and closing) is shared evenly between
    /// sections. Sections without content are skipped.
    pub fn render(&self, spec: &PresentationSpec) -> Deck {
        let normalizer = TextNormalizer::new();

        let mut title = normalizer.normalize(&spec.title);
        if title.is_empty() {
            title = "Presentation".to_string();
        }
        let subtitle = normalizer.normalize(&spec.subtitle);
        let target_slides = match spec.target_slide_count {
            0 => self.default_target_slides,
            n => n,
        };

        let mut deck = Deck::new(title.clone());
        deck.add_slide(self.title_slide(&title, &subtitle));

        if spec.sections.is_empty() {
            log::warn!("No sections found in presentation spec");
        } else {
            let available = target_slides.saturating_sub(2).max(1);
            let per_section = (available / spec.sections.len()).max(1);

            for (idx, section) in spec.sections.iter().enumerate() {
                let mut section_title = normalizer.normalize(&section.title);
                if section_title.is_empty() {
                    section_title = format!("Section {}", idx + 1);
                }

                if section.content.is_empty() {
                    log::warn!("No content found for section: {}", section_title);
                    continue;
                }

                let slides =
                    self.distributor
                        .distribute(&section_title, &section.content, Some(per_section));
                for slide in &slides {
                    deck.add_slide(self.content_slide(slide));
                }
                log::debug!(
                    "Section {:?} rendered on {} slide(s)",
                    section_title,
                    slides.len()
                );
            }
        }

        let call_to_action = normalizer.normalize(&spec.call_to_action);
        deck.add_slide(self.closing_slide(&call_to_action));

        log::info!(
            "Rendered deck {:?}: {} slides (target {})",
            deck.title,
            deck.slide_count(),
            target_slides
        );
        deck
    }

    fn title_slide(&self, title: &str, subtitle: &str) -> RenderedSlide {
        let mut body = Vec::new();
        if !subtitle.is_empty() {
            body.push(Paragraph::single(
                FormattedRun::plain(subtitle).with_font(RunFont::sized(SUBTITLE_FONT_SIZE)),
                Alignment::Center,
            ));
        }

        RenderedSlide {
            kind: SlideKind::Title,
            title: Paragraph::single(
                FormattedRun::bold(title).with_font(RunFont::sized(TITLE_FONT_SIZE)),
                Alignment::Center,
            ),
            body,
        }
    }

    /// Render one distributed slide: truncated title plus styled bullets.
    pub fn content_slide(&self, spec: &SlideSpec) -> RenderedSlide {
        let title = truncate_title(&spec.title, self.max_title_length);

        let body = spec
            .bullets
            .iter()
            .map(|b| TextNormalizer.normalize(b))
            .filter(|b| b.chars().count() > MIN_RENDERED_BULLET_CHARS)
            .take(self.distributor.max_bullets_per_slide())
            .map(|b| Paragraph::bullet(self.formatter.format_runs(&b)))
            .collect();

        RenderedSlide {
            kind: SlideKind::Content,
            title: Paragraph::single(
                FormattedRun::bold(title).with_font(RunFont::sized(SECTION_TITLE_FONT_SIZE)),
                Alignment::Left,
            ),
            body,
        }
    }

    fn closing_slide(&self, call_to_action: &str) -> RenderedSlide {
        let mut body = Vec::new();
        if !call_to_action.is_empty() {
            body.push(Paragraph::single(
                FormattedRun::plain(call_to_action)
                    .with_font(RunFont::sized(CLOSING_BODY_FONT_SIZE)),
                Alignment::Center,
            ));
        }

        RenderedSlide {
            kind: SlideKind::Closing,
            title: Paragraph::single(
                FormattedRun::bold(CLOSING_TITLE)
                    .with_font(RunFont::sized(CLOSING_TITLE_FONT_SIZE)),
                Alignment::Center,
            ),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Section;

    fn bullets(n: usize) -> Vec<String> {
        (1..=n)
            .map(|i| format!("Point {i} explains an important detail of this topic"))
            .collect()
    }

    fn spec(sections: Vec<Section>, target: usize) -> PresentationSpec {
        PresentationSpec {
            title: "Biology Presentation".to_string(),
            subtitle: "Generated from PDF Analysis".to_string(),
            target_slide_count: target,
            sections,
            call_to_action: "Questions and Discussion".to_string(),
        }
    }

    #[test]
    fn test_title_and_closing_slides() {
        let deck = PresentationRenderer::new().render(&spec(
            vec![Section::new("Cell Biology", bullets(3))],
            15,
        ));

        assert_eq!(deck.slide_count(), 3);
        let first = &deck.slides[0];
        assert_eq!(first.kind, SlideKind::Title);
        assert_eq!(first.title_text(), "Biology Presentation");
        assert_eq!(first.body_texts(), vec!["Generated from PDF Analysis"]);
        assert_eq!(first.title.runs[0].font.size_pt, TITLE_FONT_SIZE);

        let last = &deck.slides[2];
        assert_eq!(last.kind, SlideKind::Closing);
        assert_eq!(last.title_text(), "Thank You");
        assert_eq!(last.body_texts(), vec!["Questions and Discussion"]);
    }

    #[test]
    fn test_no_sections_still_has_bookends() {
        let deck = PresentationRenderer::new().render(&spec(Vec::new(), 15));
        assert_eq!(deck.slide_count(), 2);
        assert_eq!(deck.slides[1].kind, SlideKind::Closing);
    }

    #[test]
    fn test_empty_title_defaults() {
        let mut s = spec(Vec::new(), 15);
        s.title = "  ".to_string();
        s.subtitle = String::new();
        let deck = PresentationRenderer::new().render(&s);
        assert_eq!(deck.slides[0].title_text(), "Presentation");
        assert!(deck.slides[0].body.is_empty());
    }

    #[test]
    fn test_budget_shared_between_sections() {
        // target 7 -> 5 content slides -> 1 per section for 3 sections
        let sections = vec![
            Section::new("Cells", bullets(5)),
            Section::new("Genes", bullets(5)),
            Section::new("Proteins", bullets(5)),
        ];
        let deck = PresentationRenderer::new().render(&spec(sections, 7));
        assert_eq!(deck.slide_count(), 5);
        assert!(deck.content_slides().all(|s| s.body.len() == 5));
    }

    #[test]
    fn test_section_split_into_parts() {
        // target 5 -> 3 content slides for one section of 12 bullets
        let deck = PresentationRenderer::new().render(&spec(
            vec![Section::new("Cell Biology", bullets(12))],
            5,
        ));

        let titles: Vec<String> = deck.content_slides().map(|s| s.title_text()).collect();
        assert_eq!(
            titles,
            vec![
                "Cell Biology (Part 1/3)",
                "Cell Biology (Part 2/3)",
                "Cell Biology (Part 3/3)",
            ]
        );
        assert!(deck.content_slides().all(|s| s.body.len() == 4));
    }

    #[test]
    fn test_empty_section_skipped() {
        let sections = vec![
            Section::new("Empty", Vec::new()),
            Section::new("Full", bullets(2)),
        ];
        let deck = PresentationRenderer::new().render(&spec(sections, 15));
        let titles: Vec<String> = deck.content_slides().map(|s| s.title_text()).collect();
        assert_eq!(titles, vec!["Full"]);
    }

    #[test]
    fn test_untitled_section_gets_number() {
        let deck = PresentationRenderer::new().render(&spec(
            vec![Section::new("", bullets(1))],
            15,
        ));
        assert_eq!(deck.slides[1].title_text(), "Section 1");
    }

    #[test]
    fn test_content_slide_formats_and_filters() {
        let renderer = PresentationRenderer::new();
        let slide = renderer.content_slide(&SlideSpec::new(
            "A very long slide title that keeps on going well past the limit of sixty-five characters",
            vec![
                "**Mitosis** produces two identical daughter cells".to_string(),
                "tiny".to_string(),
            ],
        ));

        assert!(slide.title_text().chars().count() <= 65);
        assert!(slide.title_text().ends_with("..."));
        assert_eq!(slide.title.runs[0].font.size_pt, SECTION_TITLE_FONT_SIZE);

        assert_eq!(slide.body.len(), 1);
        let para = &slide.body[0];
        assert!(para.bulleted);
        assert!(para.runs[0].style.bold);
        assert_eq!(para.runs[0].text, "Mitosis");
        assert_eq!(para.text(), "Mitosis produces two identical daughter cells");
    }

    #[test]
    fn test_zero_target_uses_default() {
        // default 15 -> budget of 13 slides, so each of the 6 bullets gets its own
        let deck = PresentationRenderer::new().render(&spec(
            vec![Section::new("Topic Area", bullets(6))],
            0,
        ));
        assert_eq!(deck.content_slides().count(), 6);
    }
}
