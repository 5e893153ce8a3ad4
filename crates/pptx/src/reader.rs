//! PPTX text reader, used to check what a written deck contains.

use crate::package::{
    parse_relationships, read_file_from_archive, rels_path, resolve_target, PRESENTATION_PART,
};
use crate::xml::local_name;
use deck_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::io::{Read, Seek};
use zip::ZipArchive;

/// Text found on one slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideText {
    /// Slide number (1-indexed) in presentation order.
    pub number: usize,

    /// Non-empty paragraphs in document order, runs concatenated.
    pub paragraphs: Vec<String>,
}

/// Reads slide text back out of a PPTX package.
#[derive(Debug, Clone, Copy, Default)]
pub struct PptxReader;

impl PptxReader {
    /// Create a new PPTX reader.
    pub fn new() -> Self {
        Self
    }

    /// Read every slide's paragraphs, in presentation order.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<Vec<SlideText>> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let slide_paths = self.slide_order(&mut archive)?;
        let mut slides = Vec::with_capacity(slide_paths.len());

        for (idx, path) in slide_paths.iter().enumerate() {
            let content = read_file_from_archive(&mut archive, path)?;
            slides.push(SlideText {
                number: idx + 1,
                paragraphs: paragraphs_from_xml(&content)?,
            });
        }

        log::debug!("Read {} slides", slides.len());
        Ok(slides)
    }

    /// Slide part paths from the presentation relationships, ordered by the
    /// number in the target name.
    fn slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content = read_file_from_archive(archive, &rels_path(PRESENTATION_PART))?;
        let mut slides: Vec<(String, Option<usize>)> = parse_relationships(&rels_content)?
            .into_iter()
            .filter(|rel| rel.is_type("slide") && !rel.external)
            .map(|rel| {
                let order = slide_number(&rel.target);
                (resolve_target(PRESENTATION_PART, &rel.target), order)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }
}

/// Collect the text of every `a:p` paragraph in a slide part.
fn paragraphs_from_xml(xml_content: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml_content);
    // Run text keeps its own leading and trailing spaces
    reader.trim_text(false);

    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"p" => current = Some(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|e| Error::XmlError(format!("Bad slide text: {}", e)))?;
                if let Some(paragraph) = current.as_mut() {
                    paragraph.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"t" => in_text = false,
                b"p" => {
                    if let Some(paragraph) = current.take() {
                        if !paragraph.trim().is_empty() {
                            paragraphs.push(paragraph);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(format!("Error parsing slide: {}", e))),
            _ => {}
        }
    }

    Ok(paragraphs)
}

/// Extract a slide number from a target like "slides/slide3.xml".
fn slide_number(target: &str) -> Option<usize> {
    let stem = target.trim_end_matches(".xml");
    let digits: String = stem
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().ok()
}
