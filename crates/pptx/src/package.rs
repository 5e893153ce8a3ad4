//! OPC package plumbing: archive reads, relationship parts and part names.

use crate::xml::{local_name, XmlBuilder, REL_BASE};
use deck_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Read, Seek};
use zip::ZipArchive;

pub const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Prefix shared by the officeDocument content types.
pub const CT_BASE: &str = "application/vnd.openxmlformats-officedocument.";

/// One `Relationship` entry of a `.rels` part.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    /// `TargetMode="External"`; the target is a URL, not a part.
    pub external: bool,
}

impl Relationship {
    /// Whether the relationship type ends with `/{kind}`, e.g. `slideLayout`.
    pub fn is_type(&self, kind: &str) -> bool {
        self.rel_type
            .rsplit_once('/')
            .is_some_and(|(_, last)| last == kind)
    }
}

pub fn read_file_from_archive<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}

pub fn read_bytes_from_archive<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<Vec<u8>> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

    let mut content = Vec::new();
    file.read_to_end(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}

pub fn has_file<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> bool {
    archive.by_name(path).is_ok()
}

/// Parse the entries of a `.rels` part.
pub fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut rels = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut rel = Relationship {
                    id: String::new(),
                    rel_type: String::new(),
                    target: String::new(),
                    external: false,
                };

                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Id" => rel.id = value,
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        b"TargetMode" => rel.external = value == "External",
                        _ => {}
                    }
                }
                rels.push(rel);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(rels)
}

/// Write a `Relationships` part from (id, type suffix or full type, target).
pub fn write_relationships(rels: &[(String, String, String)]) -> Result<Vec<u8>> {
    let mut xml = XmlBuilder::new()?;
    xml.start(
        "Relationships",
        &[(
            "xmlns",
            "http://schemas.openxmlformats.org/package/2006/relationships",
        )],
    )?;
    for (id, rel_type, target) in rels {
        let rel_type = if rel_type.starts_with("http") {
            rel_type.clone()
        } else {
            format!("{REL_BASE}/{rel_type}")
        };
        xml.empty(
            "Relationship",
            &[
                ("Id", id.as_str()),
                ("Type", rel_type.as_str()),
                ("Target", target.as_str()),
            ],
        )?;
    }
    xml.end("Relationships")?;
    Ok(xml.finish())
}

pub fn rel(id: usize, rel_type: &str, target: impl Into<String>) -> (String, String, String) {
    (format!("rId{}", id), rel_type.to_string(), target.into())
}

/// Name of the relationships part belonging to `part`.
pub fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target against the part that declares it.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = source_part.split('/').collect();
    segments.pop();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Target for `part` as seen from a part in `ppt/<dir>/` (or `ppt/` itself
/// when `depth` is 0).
pub fn target_from_ppt(part: &str, depth: usize) -> String {
    match part.strip_prefix("ppt/") {
        Some(inner) => format!("{}{}", "../".repeat(depth), inner),
        None => format!("/{}", part),
    }
}
