//! PDF page text source.
//!
//! Wraps [`pdf_extract`], which can panic on malformed input instead of
//! returning an error; every extraction call runs under
//! [`std::panic::catch_unwind`] and a panic becomes
//! [`Error::PdfExtraction`].

use deck_core::{Error, PageSource, Result};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Extract one string per page from PDF bytes.
fn extract_pages(data: &[u8]) -> Result<Vec<String>> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(data)
    }));
    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(Error::PdfExtraction(format!("PDF extraction failed: {e}"))),
        Err(_) => Err(Error::PdfExtraction(
            "PDF extraction panicked (malformed document)".into(),
        )),
    }
}

/// Tidy one page of extracted text.
///
/// Compatibility forms (ligatures such as "ﬁ", full-width letters) are
/// folded with NFKC and NUL and byte-order marks are removed. Lines lose
/// their trailing whitespace; the page loses surrounding blank space.
pub fn clean_page(raw: &str) -> String {
    let folded: String = raw
        .nfkc()
        .filter(|&c| c != '\0' && c != BYTE_ORDER_MARK)
        .collect();

    let lines: Vec<&str> = folded.lines().map(str::trim_end).collect();
    lines.join("\n").trim().to_string()
}

/// Pages of a PDF document, read from memory.
#[derive(Debug, Clone)]
pub struct PdfPages {
    data: Vec<u8>,
    source: Option<PathBuf>,
}

impl PdfPages {
    /// Read a PDF file into memory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        log::debug!("Read {} bytes from {}", data.len(), path.display());
        Ok(Self {
            data,
            source: Some(path.to_path_buf()),
        })
    }

    /// Wrap PDF bytes already in memory.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            source: None,
        }
    }

    /// The file this document was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl PageSource for PdfPages {
    fn pages(&self) -> Result<Vec<String>> {
        let pages: Vec<String> = extract_pages(&self.data)?
            .iter()
            .map(|page| clean_page(page))
            .collect();

        let blank = pages.iter().filter(|p| p.is_empty()).count();
        log::info!(
            "Extracted {} pages ({} without text)",
            pages.len(),
            blank
        );
        Ok(pages)
    }
}
