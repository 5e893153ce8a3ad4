use anyhow::Result;
use deck_core::{DeckConfig, PresentationRenderer, PresentationSpec, Section};
use deck_pptx::{available_templates, template_path, PptxReader, PptxWriter, Template};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

fn rels(entries: &[(&str, &str, &str)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (id, kind, target) in entries {
        if target.starts_with("http") {
            xml.push_str(&format!(
                r#"<Relationship Id="{id}" Type="{REL}/{kind}" Target="{target}" TargetMode="External"/>"#
            ));
        } else {
            xml.push_str(&format!(
                r#"<Relationship Id="{id}" Type="{REL}/{kind}" Target="{target}"/>"#
            ));
        }
    }
    xml.push_str("</Relationships>");
    xml
}

/// A 4:3 "Forest" template with a title layout, a blank layout, a logo
/// image on the master and one sample slide.
fn forest_template() -> Vec<u8> {
    let ct = "application/vnd.openxmlformats-officedocument";
    let parts: Vec<(&str, String)> = vec![
        (
            "[Content_Types].xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Override PartName="/ppt/presentation.xml" ContentType="{ct}.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="{ct}.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="{ct}.presentationml.slideLayout+xml"/><Override PartName="/ppt/slideLayouts/slideLayout2.xml" ContentType="{ct}.presentationml.slideLayout+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="{ct}.theme+xml"/><Override PartName="/ppt/slides/slide1.xml" ContentType="{ct}.presentationml.slide+xml"/></Types>"#
            ),
        ),
        (
            "_rels/.rels",
            rels(&[("rId1", "officeDocument", "ppt/presentation.xml")]),
        ),
        (
            "ppt/presentation.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><p:presentation {NS}><p:sldMasterIdLst><p:sldMasterId id="2147483700" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst><p:sldId id="256" r:id="rId3"/></p:sldIdLst><p:sldSz cx="9144000" cy="6858000" type="screen4x3"/></p:presentation>"#
            ),
        ),
        (
            "ppt/_rels/presentation.xml.rels",
            rels(&[
                ("rId1", "slideMaster", "slideMasters/slideMaster1.xml"),
                ("rId2", "theme", "theme/theme1.xml"),
                ("rId3", "slide", "slides/slide1.xml"),
            ]),
        ),
        (
            "ppt/slideMasters/slideMaster1.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><p:sldMaster {NS}><p:cSld><p:spTree/></p:cSld><p:sldLayoutIdLst><p:sldLayoutId id="2147483701" r:id="rId1"/><p:sldLayoutId id="2147483702" r:id="rId2"/></p:sldLayoutIdLst></p:sldMaster>"#
            ),
        ),
        (
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            rels(&[
                ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
                ("rId2", "slideLayout", "../slideLayouts/slideLayout2.xml"),
                ("rId3", "theme", "../theme/theme1.xml"),
                ("rId4", "image", "../media/image1.png"),
                ("rId5", "hyperlink", "https://example.com/forest"),
            ]),
        ),
        (
            "ppt/slideLayouts/slideLayout1.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><p:sldLayout {NS} type="title"><p:cSld name="Title"/></p:sldLayout>"#
            ),
        ),
        (
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            rels(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]),
        ),
        (
            "ppt/slideLayouts/slideLayout2.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><p:sldLayout {NS} type="blank"><p:cSld name="Blank"/></p:sldLayout>"#
            ),
        ),
        (
            "ppt/slideLayouts/_rels/slideLayout2.xml.rels",
            rels(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]),
        ),
        (
            "ppt/theme/theme1.xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Forest"><a:themeElements/></a:theme>"#
                .to_string(),
        ),
        ("ppt/media/image1.png", "\u{89}PNG fake image".to_string()),
        (
            "ppt/slides/slide1.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><p:sld {NS}><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>Sample slide text</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
            ),
        ),
        (
            "ppt/slides/_rels/slide1.xml.rels",
            rels(&[("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")]),
        ),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        zip.start_file(name, FileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn spec() -> PresentationSpec {
    PresentationSpec {
        title: "Ecology Presentation".to_string(),
        subtitle: "Generated from PDF Analysis".to_string(),
        target_slide_count: 4,
        sections: vec![Section::new(
            "Food Webs",
            vec!["Producers capture sunlight and feed every other level of the web".to_string()],
        )],
        call_to_action: "Questions and Discussion".to_string(),
    }
}

fn part(bytes: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    content
}

fn temp_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("deck-pptx-{}-{}", label, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn template_design_parts_are_carried_over() -> Result<()> {
    let template = Template::from_reader("forest", Cursor::new(forest_template()))?;
    assert_eq!(template.name(), "forest");
    assert_eq!(template.layout_count(), 2);
    assert_eq!(template.slide_size(), (9_144_000, 6_858_000));
    assert_eq!(template.path(), None);

    let deck = PresentationRenderer::new().render(&spec());
    let bytes = PptxWriter::new()
        .with_template(template)
        .write(&deck, Cursor::new(Vec::new()))?
        .into_inner();

    let archive = ZipArchive::new(Cursor::new(bytes.as_slice()))?;
    let names: Vec<&str> = archive.file_names().collect();
    for name in [
        "ppt/slideMasters/slideMaster1.xml",
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        "ppt/slideLayouts/slideLayout1.xml",
        "ppt/slideLayouts/slideLayout2.xml",
        "ppt/media/image1.png",
    ] {
        assert!(names.contains(&name), "missing {name}");
    }

    assert!(part(&bytes, "ppt/theme/theme1.xml").contains(r#"name="Forest""#));

    let presentation = part(&bytes, "ppt/presentation.xml");
    assert!(presentation.contains(r#"<p:sldMasterId id="2147483700" r:id="rId1"/>"#));
    assert!(presentation.contains(r#"cx="9144000""#));

    // Slides sit on the blank layout, with frames fitted to 4:3
    let slide_rels = part(&bytes, "ppt/slides/_rels/slide2.xml.rels");
    assert!(slide_rels.contains(r#"Target="../slideLayouts/slideLayout2.xml""#));
    assert!(part(&bytes, "ppt/slides/slide2.xml").contains(r#"<a:off x="457200""#));

    let types = part(&bytes, "[Content_Types].xml");
    assert!(types.contains(r#"Extension="png""#));
    assert!(types.contains("/ppt/slideLayouts/slideLayout2.xml"));
    assert_eq!(types.matches("/ppt/slides/slide1.xml").count(), 1);
    Ok(())
}

#[test]
fn template_sample_slides_are_left_behind() -> Result<()> {
    let template = Template::from_reader("forest", Cursor::new(forest_template()))?;
    let deck = PresentationRenderer::new().render(&spec());
    let bytes = PptxWriter::new()
        .with_template(template)
        .write(&deck, Cursor::new(Vec::new()))?
        .into_inner();

    let slides = PptxReader::new().read(Cursor::new(bytes))?;
    assert_eq!(slides.len(), deck.slide_count());
    assert_eq!(
        slides[0].paragraphs,
        vec!["Ecology Presentation", "Generated from PDF Analysis"]
    );
    assert!(slides
        .iter()
        .all(|s| !s.paragraphs.iter().any(|p| p == "Sample slide text")));
    Ok(())
}

#[test]
fn templates_resolve_by_name_from_folder() -> Result<()> {
    let dir = temp_dir("templates");
    std::fs::write(dir.join("forest.pptx"), forest_template())?;
    std::fs::write(dir.join("Autumn.PPTX"), forest_template())?;
    std::fs::write(dir.join("~$forest.pptx"), b"lock")?;
    std::fs::write(dir.join("notes.txt"), b"not a template")?;

    assert_eq!(available_templates(&dir)?, vec!["Autumn.PPTX", "forest.pptx"]);
    assert_eq!(template_path(&dir, "forest"), Some(dir.join("forest.pptx")));
    assert_eq!(template_path(&dir, "forest.pptx"), Some(dir.join("forest.pptx")));
    assert_eq!(template_path(&dir, "winter"), None);

    let config = DeckConfig {
        template: Some("forest".to_string()),
        templates_dir: dir.clone(),
        ..DeckConfig::default()
    };
    let writer = PptxWriter::from_config(&config)?;
    let info = writer.template_info();
    assert_eq!(info.name, "forest");
    assert!(info.exists);
    assert_eq!(info.total_layouts, 2);
    assert_eq!(info.path.as_deref(), Some(dir.join("forest.pptx").as_path()));

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn missing_templates_folder_lists_nothing() -> Result<()> {
    let dir = Path::new("definitely/not/a/templates/folder");
    assert!(available_templates(dir)?.is_empty());
    Ok(())
}

#[test]
fn unreadable_template_is_an_error() {
    let dir = temp_dir("broken-template");
    std::fs::write(dir.join("broken.pptx"), b"this is not a zip archive").unwrap();

    let result = PptxWriter::new().with_named_template(&dir, "broken");
    assert!(matches!(result, Err(deck_core::Error::TemplateError(_))));

    std::fs::remove_dir_all(&dir).unwrap();
}
