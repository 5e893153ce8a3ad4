//! PPTX (Office Open XML) backend for rendered slide decks.
//!
//! [`PptxWriter`] writes a [`deck_core::Deck`] as a .pptx ZIP package,
//! optionally styled by a user [`Template`]; [`PptxReader`] reads the slide
//! text back out.

mod package;
pub mod reader;
pub mod template;
pub mod writer;
mod xml;

pub use reader::{PptxReader, SlideText};
pub use template::{available_templates, template_path, Template, TemplateInfo};
pub use writer::{with_pptx_extension, PptxWriter};
