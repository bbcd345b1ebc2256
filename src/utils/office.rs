//! Plain-text extraction for Office Open XML documents (DOCX, PPTX).
//!
//! Both formats are ZIP containers holding WordprocessingML / DrawingML parts.
//! DOCX is read straight from memory; PPTX is read from a file on disk.

use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::io::{Read, Seek};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

const DOCX_MAIN_PART: &str = "word/document.xml";

static SLIDE_PART_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").expect("valid slide part regex"));

#[derive(Error, Debug)]
pub enum OfficeError {
    #[error("failed to open archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to read document part: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed XML in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: quick_xml::Error,
    },

    #[error("presentation contains no slides")]
    NoSlides,
}

/// Extracts raw text from DOCX bytes.
///
/// Every paragraph is emitted followed by a blank line. Tabs and line breaks
/// inside runs are kept as `\t` and `\n`.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, OfficeError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))?;
    let xml = read_part(&mut archive, DOCX_MAIN_PART)?;

    let paragraphs = docx_paragraphs(&xml).map_err(|source| OfficeError::Xml {
        part: DOCX_MAIN_PART.to_string(),
        source,
    })?;
    debug!(paragraphs = paragraphs.len(), "DOCX paragraphs collected");

    let mut text = String::new();
    for paragraph in paragraphs {
        text.push_str(&paragraph);
        text.push_str("\n\n");
    }
    Ok(text)
}

/// Extracts slide text from a PPTX file on disk.
///
/// Slides are visited in slide-number order. Each slide yields its paragraph
/// lines joined with `\n`; slides are separated by a blank line and the whole
/// result is trimmed.
pub fn extract_pptx_text(path: &Path) -> Result<String, OfficeError> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut slide_parts: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let caps = SLIDE_PART_REGEX.captures(name)?;
            let number = caps[1].parse::<u32>().ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    if slide_parts.is_empty() {
        return Err(OfficeError::NoSlides);
    }
    slide_parts.sort_by_key(|(number, _)| *number);

    let mut slides = Vec::with_capacity(slide_parts.len());
    for (_, part) in &slide_parts {
        let xml = read_part(&mut archive, part)?;
        let lines = slide_lines(&xml).map_err(|source| OfficeError::Xml {
            part: part.clone(),
            source,
        })?;
        slides.push(lines.join("\n"));
    }
    debug!(slides = slides.len(), "PPTX slides collected");

    Ok(slides.join("\n\n").trim().to_string())
}

fn read_part<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> Result<String, OfficeError> {
    let mut part = archive.by_name(name)?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(xml)
}

fn docx_paragraphs(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    // Text boxes nest whole paragraphs inside a run of the enclosing one
    let mut open: Vec<String> = Vec::new();
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => open.push(String::new()),
                b"w:r" => run_depth += 1,
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:p" => {
                    if let Some(paragraph) = open.pop() {
                        paragraphs.push(paragraph);
                    }
                }
                b"w:r" => run_depth = run_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" => paragraphs.push(String::new()),
                // w:tab also declares tab stops inside w:pPr; only runs carry content
                b"w:tab" if run_depth > 0 => push_to_open(&mut open, "\t"),
                b"w:br" | b"w:cr" if run_depth > 0 => push_to_open(&mut open, "\n"),
                _ => {}
            },
            Event::Text(e) if in_text => push_to_open(&mut open, &e.unescape()?),
            Event::CData(e) if in_text => push_to_open(&mut open, &String::from_utf8_lossy(&e)),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

fn push_to_open(open: &mut [String], text: &str) {
    if let Some(current) = open.last_mut() {
        current.push_str(text);
    }
}

fn slide_lines(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"a:p" => {
                    in_paragraph = true;
                    current.clear();
                }
                b"a:t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"a:p" => {
                    in_paragraph = false;
                    lines.push(std::mem::take(&mut current));
                }
                b"a:t" => in_text = false,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"a:p" => lines.push(String::new()),
                b"a:br" if in_paragraph => current.push('\n'),
                _ => {}
            },
            Event::Text(e) if in_text => current.push_str(&e.unescape()?),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(lines)
}
