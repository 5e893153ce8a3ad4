//! PPTX package writer.
//!
//! Emits a PresentationML package with one slide part per rendered slide.
//! The master, layout and theme come from a [`Template`] when one is set and
//! from a small built-in design otherwise. Every slide draws its text in
//! absolutely positioned text boxes, so no placeholder inheritance is
//! involved and any template layout works.

use crate::package::{rel, target_from_ppt, write_relationships, CT_BASE};
use crate::template::{template_path, Design, Template, TemplateInfo};
use crate::xml::{XmlBuilder, NS_A, NS_P, NS_R};
use deck_core::{
    Alignment, Deck, DeckConfig, DeckWriter, Error, FormattedRun, Paragraph, RenderedSlide, Result,
    SlideKind, DEFAULT_TEMPLATE,
};
use std::fs::File;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// 16:9 slide size in EMU.
pub const SLIDE_WIDTH: i64 = 12_192_000;
pub const SLIDE_HEIGHT: i64 = 6_858_000;

/// First slide id; PowerPoint requires ids of at least 256.
const FIRST_SLIDE_ID: usize = 256;

/// Presentation relationships before the slides (master and theme).
const FIXED_PRESENTATION_RELS: usize = 2;

const BULLET_MARGIN: &str = "342900";
const BULLET_SPACING_AFTER: &str = "1200";

/// Position and size of a text box, in EMU.
#[derive(Debug, Clone, Copy)]
struct Frame {
    x: i64,
    y: i64,
    cx: i64,
    cy: i64,
}

impl Frame {
    const fn new(x: i64, y: i64, cx: i64, cy: i64) -> Self {
        Self { x, y, cx, cy }
    }

    /// Map a frame laid out for the 16:9 default onto another slide size.
    fn scaled(self, (width, height): (i64, i64)) -> Self {
        Self {
            x: self.x * width / SLIDE_WIDTH,
            y: self.y * height / SLIDE_HEIGHT,
            cx: self.cx * width / SLIDE_WIDTH,
            cy: self.cy * height / SLIDE_HEIGHT,
        }
    }
}

/// Title and body frames for one kind of slide.
fn frames(kind: SlideKind) -> (Frame, Frame) {
    match kind {
        SlideKind::Title => (
            Frame::new(914_400, 2_130_425, 10_363_200, 1_470_025),
            Frame::new(1_828_800, 3_886_200, 8_534_400, 1_752_600),
        ),
        SlideKind::Content => (
            Frame::new(609_600, 304_800, 10_972_800, 1_143_000),
            Frame::new(609_600, 1_600_200, 10_972_800, 4_800_600),
        ),
        SlideKind::Closing => (
            Frame::new(914_400, 2_286_000, 10_363_200, 1_143_000),
            Frame::new(914_400, 3_581_400, 10_363_200, 1_143_000),
        ),
    }
}

fn zip_err(e: zip::result::ZipError) -> Error {
    Error::ZipError(e.to_string())
}

/// Writes a [`Deck`] as a .pptx file.
#[derive(Debug, Clone, Default)]
pub struct PptxWriter {
    creator: Option<String>,
    template: Option<Template>,
    /// Requested template name, kept even when the file was not found.
    template_name: Option<String>,
}

impl PptxWriter {
    /// Create a new PPTX writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer using the template selected in the configuration.
    pub fn from_config(config: &DeckConfig) -> Result<Self> {
        match config.template_name() {
            Some(name) => Self::new().with_named_template(&config.templates_dir, name),
            None => Ok(Self::new()),
        }
    }

    /// Set the author recorded in the document properties.
    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    /// Use the design parts of `template` for every deck written.
    pub fn with_template(mut self, template: Template) -> Self {
        self.template_name = Some(template.name().to_string());
        self.template = Some(template);
        self
    }

    /// Use the named template from `dir`. A template that is not there falls
    /// back to the built-in design; one that exists but cannot be read is an
    /// error.
    pub fn with_named_template(mut self, dir: &Path, name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() || name == DEFAULT_TEMPLATE {
            return Ok(self);
        }

        match template_path(dir, name) {
            Some(path) => {
                let template = Template::open(&path)?;
                self.template = Some(template);
                self.template_name = Some(name.to_string());
                Ok(self)
            }
            None => {
                log::warn!(
                    "Template '{}' not found in {}, using the built-in design",
                    name,
                    dir.display()
                );
                self.template = None;
                self.template_name = Some(name.to_string());
                Ok(self)
            }
        }
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    /// Describe the design this writer uses.
    pub fn template_info(&self) -> TemplateInfo {
        TemplateInfo {
            name: self
                .template_name
                .clone()
                .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
            path: self
                .template
                .as_ref()
                .and_then(|t| t.path())
                .map(Path::to_path_buf),
            total_layouts: self.template.as_ref().map_or(1, Template::layout_count),
            exists: self.template.is_some(),
        }
    }

    /// Write the deck as a PPTX package into `writer`.
    pub fn write<W: Write + Seek>(&self, deck: &Deck, writer: W) -> Result<W> {
        let builtin;
        let design = match &self.template {
            Some(template) => &template.design,
            None => {
                builtin = Design::builtin()?;
                &builtin
            }
        };

        let mut zip = ZipWriter::new(writer);
        let slide_count = deck.slide_count();

        let mut parts: Vec<(String, Vec<u8>)> = vec![
            (
                "[Content_Types].xml".to_string(),
                content_types(slide_count, design)?,
            ),
            ("_rels/.rels".to_string(), package_rels()?),
            ("docProps/core.xml".to_string(), self.core_props(deck)?),
            ("docProps/app.xml".to_string(), app_props(slide_count)?),
            (
                "ppt/presentation.xml".to_string(),
                presentation(slide_count, design)?,
            ),
            (
                "ppt/_rels/presentation.xml.rels".to_string(),
                presentation_rels(slide_count, design)?,
            ),
        ];

        let layout_rels = slide_rels(design)?;
        for (idx, slide) in deck.slides.iter().enumerate() {
            let number = idx + 1;
            parts.push((
                format!("ppt/slides/slide{}.xml", number),
                slide_xml(slide, design.slide_size)?,
            ));
            parts.push((
                format!("ppt/slides/_rels/slide{}.xml.rels", number),
                layout_rels.clone(),
            ));
        }

        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let all_parts = parts.iter().chain(design.parts.iter());
        for (name, bytes) in all_parts {
            zip.start_file(name.as_str(), options).map_err(zip_err)?;
            zip.write_all(bytes)?;
        }

        let writer = zip.finish().map_err(zip_err)?;
        log::debug!(
            "Wrote {} package parts for {} slides",
            parts.len() + design.parts.len(),
            slide_count
        );
        Ok(writer)
    }

    /// Write the deck to a file, adding a `.pptx` extension when missing.
    pub fn save(&self, deck: &Deck, path: &Path) -> Result<PathBuf> {
        let path = with_pptx_extension(path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(&path)?;
        self.write(deck, file)?;

        log::info!("Saved {} slides to {}", deck.slide_count(), path.display());
        Ok(path)
    }

    fn core_props(&self, deck: &Deck) -> Result<Vec<u8>> {
        let mut xml = XmlBuilder::new()?;
        xml.start(
            "cp:coreProperties",
            &[
                (
                    "xmlns:cp",
                    "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
                ),
                ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
                ("xmlns:dcterms", "http://purl.org/dc/terms/"),
                ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
            ],
        )?;
        xml.text_element("dc:title", &deck.title)?;
        xml.text_element("dc:creator", self.creator.as_deref().unwrap_or("deck-pptx"))?;
        xml.end("cp:coreProperties")?;
        Ok(xml.finish())
    }
}

impl DeckWriter for PptxWriter {
    fn save(&self, deck: &Deck, path: &Path) -> Result<PathBuf> {
        PptxWriter::save(self, deck, path)
    }
}

/// Append `.pptx` unless the path already ends with it.
pub fn with_pptx_extension(path: &Path) -> PathBuf {
    let has_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pptx"));
    if has_ext {
        return path.to_path_buf();
    }

    let mut name = path.as_os_str().to_owned();
    name.push(".pptx");
    PathBuf::from(name)
}

fn content_types(slide_count: usize, design: &Design) -> Result<Vec<u8>> {
    let mut xml = XmlBuilder::new()?;
    xml.start(
        "Types",
        &[(
            "xmlns",
            "http://schemas.openxmlformats.org/package/2006/content-types",
        )],
    )?;
    xml.empty(
        "Default",
        &[
            ("Extension", "rels"),
            (
                "ContentType",
                "application/vnd.openxmlformats-package.relationships+xml",
            ),
        ],
    )?;
    xml.empty(
        "Default",
        &[("Extension", "xml"), ("ContentType", "application/xml")],
    )?;
    for (extension, content_type) in &design.defaults {
        xml.empty(
            "Default",
            &[
                ("Extension", extension.as_str()),
                ("ContentType", content_type.as_str()),
            ],
        )?;
    }

    let mut overrides = vec![
        (
            "/ppt/presentation.xml".to_string(),
            format!("{CT_BASE}presentationml.presentation.main+xml"),
        ),
        (
            "/docProps/core.xml".to_string(),
            "application/vnd.openxmlformats-package.core-properties+xml".to_string(),
        ),
        (
            "/docProps/app.xml".to_string(),
            format!("{CT_BASE}extended-properties+xml"),
        ),
    ];
    overrides.extend(design.overrides.iter().cloned());
    for number in 1..=slide_count {
        overrides.push((
            format!("/ppt/slides/slide{}.xml", number),
            format!("{CT_BASE}presentationml.slide+xml"),
        ));
    }

    for (part, content_type) in &overrides {
        xml.empty(
            "Override",
            &[("PartName", part.as_str()), ("ContentType", content_type.as_str())],
        )?;
    }

    xml.end("Types")?;
    Ok(xml.finish())
}

fn package_rels() -> Result<Vec<u8>> {
    write_relationships(&[
        rel(1, "officeDocument", "ppt/presentation.xml"),
        rel(
            2,
            "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties",
            "docProps/core.xml",
        ),
        rel(3, "extended-properties", "docProps/app.xml"),
    ])
}

fn presentation_rels(slide_count: usize, design: &Design) -> Result<Vec<u8>> {
    let mut rels = vec![
        rel(1, "slideMaster", target_from_ppt(&design.master, 0)),
        rel(2, "theme", target_from_ppt(&design.theme, 0)),
    ];
    for idx in 0..slide_count {
        rels.push(rel(
            idx + 1 + FIXED_PRESENTATION_RELS,
            "slide",
            format!("slides/slide{}.xml", idx + 1),
        ));
    }
    write_relationships(&rels)
}

fn slide_rels(design: &Design) -> Result<Vec<u8>> {
    write_relationships(&[rel(1, "slideLayout", target_from_ppt(&design.layout, 1))])
}

fn app_props(slide_count: usize) -> Result<Vec<u8>> {
    let mut xml = XmlBuilder::new()?;
    xml.start(
        "Properties",
        &[(
            "xmlns",
            "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties",
        )],
    )?;
    xml.text_element("Application", "deck-pptx")?;
    xml.text_element("Slides", &slide_count.to_string())?;
    xml.end("Properties")?;
    Ok(xml.finish())
}

fn presentation(slide_count: usize, design: &Design) -> Result<Vec<u8>> {
    let mut xml = XmlBuilder::new()?;
    xml.start(
        "p:presentation",
        &[
            ("xmlns:a", NS_A),
            ("xmlns:r", NS_R),
            ("xmlns:p", NS_P),
            ("saveSubsetFonts", "1"),
        ],
    )?;

    xml.start("p:sldMasterIdLst", &[])?;
    xml.empty(
        "p:sldMasterId",
        &[("id", design.master_id.as_str()), ("r:id", "rId1")],
    )?;
    xml.end("p:sldMasterIdLst")?;

    if slide_count > 0 {
        xml.start("p:sldIdLst", &[])?;
        for idx in 0..slide_count {
            let id = (FIRST_SLIDE_ID + idx).to_string();
            let rel_id = format!("rId{}", idx + 1 + FIXED_PRESENTATION_RELS);
            xml.empty("p:sldId", &[("id", id.as_str()), ("r:id", rel_id.as_str())])?;
        }
        xml.end("p:sldIdLst")?;
    }

    let (cx, cy) = (design.slide_size.0.to_string(), design.slide_size.1.to_string());
    xml.empty("p:sldSz", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    xml.empty("p:notesSz", &[("cx", "6858000"), ("cy", "9144000")])?;
    xml.end("p:presentation")?;
    Ok(xml.finish())
}

/// Serialize one rendered slide.
fn slide_xml(slide: &RenderedSlide, slide_size: (i64, i64)) -> Result<Vec<u8>> {
    let mut xml = XmlBuilder::new()?;
    xml.start(
        "p:sld",
        &[("xmlns:a", NS_A), ("xmlns:r", NS_R), ("xmlns:p", NS_P)],
    )?;
    xml.start("p:cSld", &[])?;
    xml.start("p:spTree", &[])?;
    group_shape_header(&mut xml)?;

    let (title_frame, body_frame) = frames(slide.kind);
    let title_frame = title_frame.scaled(slide_size);
    let body_frame = body_frame.scaled(slide_size);
    let title_anchor = match slide.kind {
        SlideKind::Content => "b",
        _ => "ctr",
    };
    text_box(
        &mut xml,
        2,
        "Title",
        title_frame,
        title_anchor,
        std::slice::from_ref(&slide.title),
    )?;
    if !slide.body.is_empty() {
        text_box(&mut xml, 3, "Body", body_frame, "t", &slide.body)?;
    }

    xml.end("p:spTree")?;
    xml.end("p:cSld")?;
    xml.start("p:clrMapOvr", &[])?;
    xml.empty("a:masterClrMapping", &[])?;
    xml.end("p:clrMapOvr")?;
    xml.end("p:sld")?;
    Ok(xml.finish())
}

fn group_shape_header(xml: &mut XmlBuilder) -> Result<()> {
    xml.start("p:nvGrpSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", "1"), ("name", "")])?;
    xml.empty("p:cNvGrpSpPr", &[])?;
    xml.empty("p:nvPr", &[])?;
    xml.end("p:nvGrpSpPr")?;
    xml.empty("p:grpSpPr", &[])
}

fn text_box(
    xml: &mut XmlBuilder,
    id: usize,
    name: &str,
    frame: Frame,
    anchor: &str,
    paragraphs: &[Paragraph],
) -> Result<()> {
    let id = id.to_string();
    let name = format!("{} {}", name, id);

    xml.start("p:sp", &[])?;
    xml.start("p:nvSpPr", &[])?;
    xml.empty("p:cNvPr", &[("id", id.as_str()), ("name", name.as_str())])?;
    xml.empty("p:cNvSpPr", &[("txBox", "1")])?;
    xml.empty("p:nvPr", &[])?;
    xml.end("p:nvSpPr")?;

    xml.start("p:spPr", &[])?;
    xml.start("a:xfrm", &[])?;
    let (x, y) = (frame.x.to_string(), frame.y.to_string());
    let (cx, cy) = (frame.cx.to_string(), frame.cy.to_string());
    xml.empty("a:off", &[("x", x.as_str()), ("y", y.as_str())])?;
    xml.empty("a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    xml.end("a:xfrm")?;
    xml.start("a:prstGeom", &[("prst", "rect")])?;
    xml.empty("a:avLst", &[])?;
    xml.end("a:prstGeom")?;
    xml.empty("a:noFill", &[])?;
    xml.end("p:spPr")?;

    xml.start("p:txBody", &[])?;
    xml.start("a:bodyPr", &[("wrap", "square"), ("anchor", anchor)])?;
    xml.empty("a:normAutofit", &[])?;
    xml.end("a:bodyPr")?;
    xml.empty("a:lstStyle", &[])?;
    for paragraph in paragraphs {
        paragraph_xml(xml, paragraph)?;
    }
    xml.end("p:txBody")?;
    xml.end("p:sp")
}

fn paragraph_xml(xml: &mut XmlBuilder, paragraph: &Paragraph) -> Result<()> {
    let algn = match paragraph.alignment {
        Alignment::Left => "l",
        Alignment::Center => "ctr",
    };

    xml.start("a:p", &[])?;
    if paragraph.bulleted {
        let indent = format!("-{}", BULLET_MARGIN);
        xml.start(
            "a:pPr",
            &[
                ("marL", BULLET_MARGIN),
                ("indent", indent.as_str()),
                ("algn", algn),
            ],
        )?;
        xml.start("a:spcAft", &[])?;
        xml.empty("a:spcPts", &[("val", BULLET_SPACING_AFTER)])?;
        xml.end("a:spcAft")?;
        xml.empty("a:buFont", &[("typeface", "Arial")])?;
        xml.empty("a:buChar", &[("char", "\u{2022}")])?;
    } else {
        xml.start("a:pPr", &[("algn", algn)])?;
        xml.empty("a:buNone", &[])?;
    }
    xml.end("a:pPr")?;

    for run in &paragraph.runs {
        run_xml(xml, run)?;
    }
    xml.end("a:p")
}

fn run_xml(xml: &mut XmlBuilder, run: &FormattedRun) -> Result<()> {
    // DrawingML sizes are in hundredths of a point
    let size = (run.font.size_pt * 100).to_string();
    let bold = if run.style.bold { "1" } else { "0" };
    let italic = if run.style.italic { "1" } else { "0" };

    xml.start("a:r", &[])?;
    xml.start(
        "a:rPr",
        &[
            ("lang", "en-US"),
            ("sz", size.as_str()),
            ("b", bold),
            ("i", italic),
            ("dirty", "0"),
        ],
    )?;
    xml.empty("a:latin", &[("typeface", run.font.family.as_str())])?;
    xml.end("a:rPr")?;
    xml.text_element("a:t", &run.text)?;
    xml.end("a:r")
}
