//! Plain-text extraction for uploaded study material (PDF, DOCX, TXT).

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{MemoraError, Result};

/// Upper bound on the decompressed size of `word/document.xml`.
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

pub trait TextExtractor {
    fn extract(&self, path: &Path) -> Result<String>;
}

/// Picks a reader by file extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExtractor;

impl TextExtractor for FileExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();
        let text = match extension.as_str() {
            "txt" | "md" => String::from_utf8(read_document(path)?)
                .map_err(|e| MemoraError::unprocessable(path, format!("not UTF-8 text: {e}")))?,
            "pdf" => {
                let bytes = read_document(path)?;
                pdf_extract::extract_text_from_mem(&bytes)
                    .map_err(|e| MemoraError::unprocessable(path, format!("pdf: {e}")))?
            }
            "docx" => {
                let bytes = read_document(path)?;
                extract_docx(&bytes).map_err(|reason| MemoraError::unprocessable(path, reason))?
            }
            other => {
                return Err(MemoraError::unprocessable(
                    path,
                    format!("unsupported file type '{other}'"),
                ))
            }
        };
        if text.trim().is_empty() {
            return Err(MemoraError::unprocessable(
                path,
                "no selectable text found (run OCR on scanned PDFs first)",
            ));
        }
        Ok(text)
    }
}

#[derive(Debug)]
pub struct ExtractedCorpus {
    pub text: String,
    pub processed: Vec<PathBuf>,
    pub failures: Vec<MemoraError>,
}

/// Extract every document, skipping the ones that fail.
pub fn extract_all<E, P>(extractor: &E, paths: &[P]) -> ExtractedCorpus
where
    E: TextExtractor + ?Sized,
    P: AsRef<Path>,
{
    let mut parts = Vec::new();
    let mut processed = Vec::new();
    let mut failures = Vec::new();
    for path in paths {
        let path = path.as_ref();
        match extractor.extract(path) {
            Ok(text) => {
                info!(path = %path.display(), chars = text.chars().count(), "extracted document");
                parts.push(text);
                processed.push(path.to_path_buf());
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping document");
                failures.push(err);
            }
        }
    }
    ExtractedCorpus {
        text: parts.join("\n"),
        processed,
        failures,
    }
}

fn read_document(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| MemoraError::unprocessable(path, e.to_string()))
}

fn extract_docx(bytes: &[u8]) -> std::result::Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| "word/document.xml not found".to_string())?;
    let mut xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut xml)
        .map_err(|e| e.to_string())?;
    if xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err("word/document.xml exceeds size limit".to_string());
    }
    docx_paragraph_text(&xml)
}

/// Collect `<w:t>` runs, one output line per `<w:p>` paragraph.
fn docx_paragraph_text(xml: &[u8]) -> std::result::Result<String, String> {
    use quick_xml::events::Event;

    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut out = String::new();
    let mut buf = Vec::new();
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(text)) if in_text => {
                let unescaped = text.unescape().map_err(|e| e.to_string())?;
                out.push_str(&unescaped);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}
