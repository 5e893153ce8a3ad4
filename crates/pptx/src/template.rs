//! Presentation templates.
//!
//! A template is an existing .pptx file. Its design parts are carried into
//! every deck written with it: the first slide master, the layouts and theme
//! that master references, and any media those parts pull in. Slides,
//! notes and document properties of the template are left behind.
//!
//! Templates are looked up by name in a folder (`templates/` by default), so
//! `"green"` and `"green.pptx"` both select `templates/green.pptx`.

use crate::package::{
    has_file, parse_relationships, read_bytes_from_archive, read_file_from_archive, rel,
    rels_path, resolve_target, write_relationships, CT_BASE, PRESENTATION_PART,
};
use crate::writer::{SLIDE_HEIGHT, SLIDE_WIDTH};
use crate::xml::local_name;
use deck_core::{Error, Result, DEFAULT_TEMPLATE};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

const BUILTIN_MASTER: &str = "ppt/slideMasters/slideMaster1.xml";
const BUILTIN_LAYOUT: &str = "ppt/slideLayouts/slideLayout1.xml";
const BUILTIN_THEME: &str = "ppt/theme/theme1.xml";

/// Lowest id PowerPoint accepts for masters and layouts.
const BUILTIN_MASTER_ID: &str = "2147483648";

fn template_err(message: impl Into<String>) -> Error {
    Error::TemplateError(message.into())
}

/// The parts that give a deck its look, plus what the writer needs to link
/// slides into them.
#[derive(Clone)]
pub(crate) struct Design {
    /// Part name and bytes, relationship parts included.
    pub parts: Vec<(String, Vec<u8>)>,
    /// `Override` entries (`/part`, content type) for `parts`.
    pub overrides: Vec<(String, String)>,
    /// Extra `Default` entries (extension, content type), e.g. for media.
    pub defaults: Vec<(String, String)>,
    pub master: String,
    pub master_id: String,
    pub theme: String,
    /// Layout every written slide is based on.
    pub layout: String,
    pub layout_count: usize,
    /// Slide size in EMU.
    pub slide_size: (i64, i64),
}

impl fmt::Debug for Design {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Design")
            .field("parts", &self.parts.len())
            .field("master", &self.master)
            .field("theme", &self.theme)
            .field("layout", &self.layout)
            .field("slide_size", &self.slide_size)
            .finish()
    }
}

impl Design {
    /// One blank layout under a plain master with a green-accented theme.
    pub(crate) fn builtin() -> Result<Self> {
        let master_rels = write_relationships(&[
            rel(1, "slideLayout", "../slideLayouts/slideLayout1.xml"),
            rel(2, "theme", "../theme/theme1.xml"),
        ])?;
        let layout_rels =
            write_relationships(&[rel(1, "slideMaster", "../slideMasters/slideMaster1.xml")])?;

        Ok(Self {
            parts: vec![
                (BUILTIN_MASTER.to_string(), SLIDE_MASTER_XML.as_bytes().to_vec()),
                (rels_path(BUILTIN_MASTER), master_rels),
                (BUILTIN_LAYOUT.to_string(), SLIDE_LAYOUT_XML.as_bytes().to_vec()),
                (rels_path(BUILTIN_LAYOUT), layout_rels),
                (BUILTIN_THEME.to_string(), THEME_XML.as_bytes().to_vec()),
            ],
            overrides: vec![
                (
                    format!("/{BUILTIN_MASTER}"),
                    format!("{CT_BASE}presentationml.slideMaster+xml"),
                ),
                (
                    format!("/{BUILTIN_LAYOUT}"),
                    format!("{CT_BASE}presentationml.slideLayout+xml"),
                ),
                (format!("/{BUILTIN_THEME}"), format!("{CT_BASE}theme+xml")),
            ],
            defaults: Vec::new(),
            master: BUILTIN_MASTER.to_string(),
            master_id: BUILTIN_MASTER_ID.to_string(),
            theme: BUILTIN_THEME.to_string(),
            layout: BUILTIN_LAYOUT.to_string(),
            layout_count: 1,
            slide_size: (SLIDE_WIDTH, SLIDE_HEIGHT),
        })
    }

    /// Collect the design parts of an existing presentation.
    fn from_archive<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Self> {
        let presentation = read_file_from_archive(archive, PRESENTATION_PART)?;
        let summary = presentation_summary(&presentation)?;
        let pres_rels =
            parse_relationships(&read_file_from_archive(archive, &rels_path(PRESENTATION_PART))?)?;

        let master_rel = pres_rels
            .iter()
            .find(|r| r.id == summary.master_rel_id)
            .ok_or_else(|| template_err("slide master relationship is missing"))?;
        let master = resolve_target(PRESENTATION_PART, &master_rel.target);
        let theme = pres_rels
            .iter()
            .find(|r| r.is_type("theme"))
            .map(|r| resolve_target(PRESENTATION_PART, &r.target))
            .ok_or_else(|| template_err("presentation has no theme"))?;

        let mut parts: Vec<(String, Vec<u8>)> = Vec::new();
        let mut layouts: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut queue = VecDeque::from([master.clone(), theme.clone()]);

        while let Some(part) = queue.pop_front() {
            if !is_design_part(&part) || !seen.insert(part.clone()) {
                continue;
            }
            if !has_file(archive, &part) {
                log::warn!("Template references missing part {}", part);
                continue;
            }
            parts.push((part.clone(), read_bytes_from_archive(archive, &part)?));

            let rels_name = rels_path(&part);
            if !has_file(archive, &rels_name) {
                continue;
            }
            let rels_xml = read_file_from_archive(archive, &rels_name)?;
            for rel in parse_relationships(&rels_xml)?.iter().filter(|r| !r.external) {
                let target = resolve_target(&part, &rel.target);
                if part == master && rel.is_type("slideLayout") {
                    layouts.push(target.clone());
                }
                queue.push_back(target);
            }
            parts.push((rels_name, rels_xml.into_bytes()));
        }

        if !parts.iter().any(|(name, _)| *name == master) {
            return Err(template_err(format!("slide master {} is missing", master)));
        }

        let layout = layouts
            .iter()
            .find(|layout| {
                parts
                    .iter()
                    .any(|(name, bytes)| name == *layout && is_blank_layout(bytes))
            })
            .or_else(|| layouts.first())
            .cloned()
            .ok_or_else(|| template_err("slide master has no layouts"))?;

        let types = read_file_from_archive(archive, "[Content_Types].xml")?;
        let (mut defaults, mut overrides) = content_type_entries(&types)?;
        let names: HashSet<String> = parts.iter().map(|(name, _)| format!("/{name}")).collect();
        overrides.retain(|(part, _)| names.contains(part));
        defaults.retain(|(ext, _)| {
            !ext.eq_ignore_ascii_case("rels") && !ext.eq_ignore_ascii_case("xml")
        });

        Ok(Self {
            parts,
            overrides,
            defaults,
            master,
            master_id: summary.master_id,
            theme,
            layout,
            layout_count: layouts.len(),
            slide_size: summary.slide_size,
        })
    }
}

/// Parts a template may contribute. Anything that would clash with the parts
/// the writer generates is excluded.
fn is_design_part(path: &str) -> bool {
    path.starts_with("ppt/")
        && path != PRESENTATION_PART
        && !path.starts_with("ppt/_rels/")
        && !path.starts_with("ppt/slides/")
        && !path.starts_with("ppt/notesSlides/")
}

#[derive(Debug)]
struct PresentationSummary {
    master_id: String,
    master_rel_id: String,
    slide_size: (i64, i64),
}

/// First slide master entry and the slide size of a `presentation.xml`.
fn presentation_summary(xml: &str) -> Result<PresentationSummary> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut master: Option<(String, String)> = None;
    let mut slide_size = (SLIDE_WIDTH, SLIDE_HEIGHT);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                match local_name(e.name().as_ref()) {
                    b"sldMasterId" if master.is_none() => {
                        let mut id = String::new();
                        let mut rel_id = String::new();
                        for attr in e.attributes().flatten() {
                            let value = String::from_utf8_lossy(&attr.value).to_string();
                            let key = attr.key.as_ref();
                            if key == b"id" {
                                id = value;
                            } else if local_name(key) == b"id" {
                                rel_id = value;
                            }
                        }
                        master = Some((id, rel_id));
                    }
                    b"sldSz" => {
                        for attr in e.attributes().flatten() {
                            let value = String::from_utf8_lossy(&attr.value).parse::<i64>().ok();
                            match (attr.key.as_ref(), value) {
                                (b"cx", Some(cx)) if cx > 0 => slide_size.0 = cx,
                                (b"cy", Some(cy)) if cy > 0 => slide_size.1 = cy,
                                _ => {}
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing presentation: {}",
                    e
                )))
            }
            _ => {}
        }
    }

    let (master_id, master_rel_id) =
        master.ok_or_else(|| template_err("presentation has no slide master"))?;
    Ok(PresentationSummary {
        master_id,
        master_rel_id,
        slide_size,
    })
}

/// Whether a layout part declares `type="blank"` on its root.
fn is_blank_layout(bytes: &[u8]) -> bool {
    let Ok(xml) = std::str::from_utf8(bytes) else {
        return false;
    };
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                return local_name(e.name().as_ref()) == b"sldLayout"
                    && e.attributes()
                        .flatten()
                        .any(|a| a.key.as_ref() == b"type" && a.value.as_ref() == b"blank");
            }
            Ok(Event::Eof) | Err(_) => return false,
            _ => {}
        }
    }
}

type ContentTypeEntries = (Vec<(String, String)>, Vec<(String, String)>);

/// `Default` and `Override` entries of `[Content_Types].xml`.
fn content_type_entries(xml: &str) -> Result<ContentTypeEntries> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut defaults = Vec::new();
    let mut overrides = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                let (key_attr, target) = match local_name(e.name().as_ref()) {
                    b"Default" => (b"Extension".as_slice(), &mut defaults),
                    b"Override" => (b"PartName".as_slice(), &mut overrides),
                    _ => continue,
                };

                let mut key = String::new();
                let mut content_type = String::new();
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    if attr.key.as_ref() == key_attr {
                        key = value;
                    } else if attr.key.as_ref() == b"ContentType" {
                        content_type = value;
                    }
                }
                if !key.is_empty() && !content_type.is_empty() {
                    target.push((key, content_type));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing content types: {}",
                    e
                )))
            }
            _ => {}
        }
    }

    Ok((defaults, overrides))
}

/// A user template loaded from a .pptx file.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    path: Option<PathBuf>,
    pub(crate) design: Design,
}

impl Template {
    /// Load a template file; its name is the file stem.
    pub fn open(path: &Path) -> Result<Self> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let file = File::open(path)?;
        let mut template = Self::from_reader(name, file)?;
        template.path = Some(path.to_path_buf());
        Ok(template)
    }

    /// Load a template from any PPTX byte source.
    pub fn from_reader<R: Read + Seek>(name: impl Into<String>, reader: R) -> Result<Self> {
        let name = name.into();
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| template_err(format!("'{}' is not a PPTX package: {}", name, e)))?;
        let design = Design::from_archive(&mut archive)?;

        log::info!(
            "Loaded template '{}' ({} layouts, {} parts)",
            name,
            design.layout_count,
            design.parts.len()
        );
        Ok(Self {
            name,
            path: None,
            design,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The file the template was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Layouts under the template's slide master.
    pub fn layout_count(&self) -> usize {
        self.design.layout_count
    }

    /// Slide width and height in EMU.
    pub fn slide_size(&self) -> (i64, i64) {
        self.design.slide_size
    }
}

/// What a writer will use for its design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateInfo {
    /// Requested template name, `"default"` for the built-in design.
    pub name: String,
    pub path: Option<PathBuf>,
    pub total_layouts: usize,
    /// False when the requested template was not found and the built-in
    /// design is used instead.
    pub exists: bool,
}

/// Path of the named template in `dir`, if the file exists.
///
/// `"default"` and blank names select no template.
pub fn template_path(dir: &Path, name: &str) -> Option<PathBuf> {
    let name = name.trim();
    if name.is_empty() || name == DEFAULT_TEMPLATE {
        return None;
    }

    let file_name = if name.to_lowercase().ends_with(".pptx") {
        name.to_string()
    } else {
        format!("{name}.pptx")
    };
    let path = dir.join(file_name);
    path.is_file().then_some(path)
}

/// File names of the `.pptx` templates in `dir`, sorted. Office lock files
/// (`~$...`) are skipped; a missing folder has no templates.
pub fn available_templates(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        log::debug!("No templates folder at {}", dir.display());
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.to_lowercase().ends_with(".pptx") && !name.starts_with('~') {
            names.push(name);
        }
    }

    names.sort();
    Ok(names)
}

const SLIDE_MASTER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#;

const SLIDE_LAYOUT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="blank" preserve="1"><p:cSld name="Blank"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#;

const THEME_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Deck"><a:themeElements><a:clrScheme name="Deck"><a:dk1><a:srgbClr val="1F2937"/></a:dk1><a:lt1><a:srgbClr val="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="14532D"/></a:dk2><a:lt2><a:srgbClr val="F0FDF4"/></a:lt2><a:accent1><a:srgbClr val="15803D"/></a:accent1><a:accent2><a:srgbClr val="22C55E"/></a:accent2><a:accent3><a:srgbClr val="0EA5E9"/></a:accent3><a:accent4><a:srgbClr val="F59E0B"/></a:accent4><a:accent5><a:srgbClr val="6366F1"/></a:accent5><a:accent6><a:srgbClr val="EF4444"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme><a:fontScheme name="Deck"><a:majorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Deck"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_design_is_linked() {
        let design = Design::builtin().unwrap();
        let names: Vec<&str> = design.parts.iter().map(|(n, _)| n.as_str()).collect();
        assert!(names.contains(&"ppt/slideMasters/_rels/slideMaster1.xml.rels"));
        assert_eq!(design.layout, BUILTIN_LAYOUT);
        assert_eq!(design.overrides.len(), 3);
        assert!(is_blank_layout(SLIDE_LAYOUT_XML.as_bytes()));
    }

    #[test]
    fn test_presentation_summary() {
        let xml = r#"<p:presentation xmlns:p="p" xmlns:r="r">
            <p:sldMasterIdLst><p:sldMasterId id="2147483700" r:id="rId4"/></p:sldMasterIdLst>
            <p:sldSz cx="9144000" cy="6858000" type="screen4x3"/>
        </p:presentation>"#;

        let summary = presentation_summary(xml).unwrap();
        assert_eq!(summary.master_id, "2147483700");
        assert_eq!(summary.master_rel_id, "rId4");
        assert_eq!(summary.slide_size, (9_144_000, 6_858_000));

        let err = presentation_summary("<p:presentation xmlns:p=\"p\"/>").unwrap_err();
        assert!(matches!(err, Error::TemplateError(_)));
    }

    #[test]
    fn test_layout_type_detection() {
        assert!(!is_blank_layout(br#"<p:sldLayout xmlns:p="p" type="title"/>"#));
        assert!(is_blank_layout(br#"<?xml version="1.0"?><p:sldLayout xmlns:p="p" type="blank"></p:sldLayout>"#));
        assert!(!is_blank_layout(b"\xff\xfe"));
    }

    #[test]
    fn test_content_type_entries() {
        let xml = r#"<Types xmlns="t">
            <Default Extension="png" ContentType="image/png"/>
            <Override PartName="/ppt/theme/theme1.xml" ContentType="theme"/>
        </Types>"#;
        let (defaults, overrides) = content_type_entries(xml).unwrap();
        assert_eq!(defaults, vec![("png".to_string(), "image/png".to_string())]);
        assert_eq!(
            overrides,
            vec![("/ppt/theme/theme1.xml".to_string(), "theme".to_string())]
        );
    }

    #[test]
    fn test_design_part_filter() {
        assert!(is_design_part("ppt/slideLayouts/slideLayout3.xml"));
        assert!(is_design_part("ppt/media/image1.png"));
        assert!(!is_design_part("ppt/slides/slide1.xml"));
        assert!(!is_design_part(PRESENTATION_PART));
        assert!(!is_design_part("docProps/core.xml"));
    }

    #[test]
    fn test_default_name_selects_nothing() {
        let dir = std::env::temp_dir();
        assert_eq!(template_path(&dir, "default"), None);
        assert_eq!(template_path(&dir, "  "), None);
    }
}
