//! Domain types for presentation content, from generated sections to
//! rendered slides.

use serde::{Deserialize, Serialize};

/// Typeface applied to every run.
pub const DEFAULT_FONT_FAMILY: &str = "Calibri";

/// Point size for bullet text.
pub const DEFAULT_CONTENT_FONT_SIZE: u32 = 16;

/// A topic paired with its generated bullets, before distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Slide title for this topic.
    pub title: String,

    /// Bullet content in generation order.
    pub content: Vec<String>,
}

impl Section {
    /// Create a new section.
    pub fn new(title: impl Into<String>, content: Vec<String>) -> Self {
        Self {
            title: title.into(),
            content,
        }
    }
}

/// Size-bounded content for exactly one rendered slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideSpec {
    /// Title, suffixed with "(Part i/n)" when a section spans several slides.
    pub title: String,

    /// Cleaned bullets, never more than the per-slide maximum.
    pub bullets: Vec<String>,
}

impl SlideSpec {
    /// Create a new slide spec.
    pub fn new(title: impl Into<String>, bullets: Vec<String>) -> Self {
        Self {
            title: title.into(),
            bullets,
        }
    }
}

/// Root input to rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationSpec {
    pub title: String,
    pub subtitle: String,

    /// Slide budget for the whole deck, title and closing slides included.
    pub target_slide_count: usize,

    /// Sections in presentation order.
    pub sections: Vec<Section>,

    /// Text for the closing slide.
    pub call_to_action: String,
}

/// Bold/italic flags carried by a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
}

impl RunStyle {
    pub const PLAIN: Self = Self {
        bold: false,
        italic: false,
    };
    pub const BOLD: Self = Self {
        bold: true,
        italic: false,
    };
    pub const ITALIC: Self = Self {
        bold: false,
        italic: true,
    };
}

/// Font applied to a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFont {
    pub family: String,
    pub size_pt: u32,
}

impl RunFont {
    /// Calibri at the given point size.
    pub fn sized(size_pt: u32) -> Self {
        Self {
            family: DEFAULT_FONT_FAMILY.to_string(),
            size_pt,
        }
    }
}

impl Default for RunFont {
    fn default() -> Self {
        Self::sized(DEFAULT_CONTENT_FONT_SIZE)
    }
}

/// A span of text with uniform styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedRun {
    pub text: String,
    pub style: RunStyle,
    pub font: RunFont,
}

impl FormattedRun {
    /// Create a run in the default content font.
    pub fn new(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            text: text.into(),
            style,
            font: RunFont::default(),
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, RunStyle::PLAIN)
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self::new(text, RunStyle::BOLD)
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self::new(text, RunStyle::ITALIC)
    }

    /// Replace the font of this run.
    pub fn with_font(mut self, font: RunFont) -> Self {
        self.font = font;
        self
    }
}

/// Horizontal alignment of a paragraph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    Left,
    Center,
}

/// One paragraph of rendered text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub runs: Vec<FormattedRun>,
    pub alignment: Alignment,
    /// Whether the paragraph is drawn with a bullet glyph.
    pub bulleted: bool,
}

impl Paragraph {
    /// A bulleted, left-aligned paragraph.
    pub fn bullet(runs: Vec<FormattedRun>) -> Self {
        Self {
            runs,
            alignment: Alignment::Left,
            bulleted: true,
        }
    }

    /// A single-run paragraph with no bullet glyph.
    pub fn single(run: FormattedRun, alignment: Alignment) -> Self {
        Self {
            runs: vec![run],
            alignment,
            bulleted: false,
        }
    }

    /// The paragraph text with styling dropped.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Which layout a rendered slide uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlideKind {
    /// Opening slide with centered title and subtitle.
    Title,
    /// Title plus bulleted body.
    Content,
    /// Closing slide with centered title and call-to-action.
    Closing,
}

/// A fully laid-out slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedSlide {
    pub kind: SlideKind,
    pub title: Paragraph,
    pub body: Vec<Paragraph>,
}

impl RenderedSlide {
    /// Title text with styling dropped.
    pub fn title_text(&self) -> String {
        self.title.text()
    }

    /// Body paragraph texts with styling dropped.
    pub fn body_texts(&self) -> Vec<String> {
        self.body.iter().map(Paragraph::text).collect()
    }
}

/// A rendered slide deck, ready to be written by a [`crate::DeckWriter`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    /// Deck title, used for document properties.
    pub title: String,

    /// Slides in presentation order.
    pub slides: Vec<RenderedSlide>,
}

impl Deck {
    /// Create an empty deck.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slides: Vec::new(),
        }
    }

    /// Add a slide to the deck.
    pub fn add_slide(&mut self, slide: RenderedSlide) {
        self.slides.push(slide);
    }

    /// Number of slides that will be written.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Content slides only.
    pub fn content_slides(&self) -> impl Iterator<Item = &RenderedSlide> {
        self.slides.iter().filter(|s| s.kind == SlideKind::Content)
    }
}
