//! Plain-text extraction from uploaded bytes.
//!
//! CPU-bound and blocking; callers on the runtime should run it through
//! `spawn_blocking`.

use std::panic::{self, AssertUnwindSafe};

use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent, TableChild,
    TableRowChild,
};
use tracing::debug;

use crate::file::DocumentType;
use docchat_core::{Error, Result};

/// Extract the text of a document of the given type.
pub fn extract_text(bytes: &[u8], kind: DocumentType) -> Result<String> {
    let text = match kind {
        DocumentType::Pdf => extract_pdf(bytes)?,
        DocumentType::Docx => extract_docx(bytes)?,
        DocumentType::PlainText => extract_plain(bytes)?,
    };
    debug!(%kind, bytes = bytes.len(), chars = text.len(), "extracted text");
    Ok(text)
}

/// Extract by declared MIME type; unknown types fail with `UnsupportedType`.
pub fn extract_text_for_mime(bytes: &[u8], mime: &str) -> Result<String> {
    let kind = DocumentType::from_mime(mime).ok_or_else(|| Error::UnsupportedType(mime.to_string()))?;
    extract_text(bytes, kind)
}

/// Page fragments joined with single spaces.
fn extract_pdf(bytes: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed font tables
    let raw = panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)))
        .map_err(|_| Error::ExtractionFailed("PDF parser crashed".into()))?
        .map_err(|e| Error::ExtractionFailed(format!("PDF: {}", e)))?;
    Ok(raw.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn extract_docx(bytes: &[u8]) -> Result<String> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| Error::ExtractionFailed(format!("DOCX: {}", e)))?;

    let mut out = String::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => push_paragraph(&mut out, p),
            DocumentChild::Table(t) => push_table(&mut out, t),
            _ => {}
        }
    }
    Ok(out.trim().to_string())
}

fn push_paragraph(out: &mut String, paragraph: &Paragraph) {
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for rc in &run.children {
                match rc {
                    RunChild::Text(t) => out.push_str(&t.text),
                    RunChild::Tab(_) => out.push('\t'),
                    _ => {}
                }
            }
        }
    }
    out.push('\n');
}

#[allow(irrefutable_let_patterns)]
fn push_table(out: &mut String, table: &Table) {
    for row in &table.rows {
        let TableChild::TableRow(row) = row else { continue };
        for cell in &row.cells {
            let TableRowChild::TableCell(cell) = cell else { continue };
            for content in &cell.children {
                if let TableCellContent::Paragraph(p) = content {
                    push_paragraph(out, p);
                }
            }
        }
    }
}

/// Strict UTF-8; invalid input is an extraction failure, not lossy text.
fn extract_plain(bytes: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::ExtractionFailed(format!("text is not valid UTF-8: {}", e)))?;
    Ok(text.to_string())
}
