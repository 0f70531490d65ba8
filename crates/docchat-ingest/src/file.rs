//! Supported upload formats.

use std::fmt;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TEXT: &str = "text/plain";

/// Formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentType {
    pub const SUPPORTED_MIME_TYPES: [&'static str; 3] = [MIME_PDF, MIME_DOCX, MIME_TEXT];

    /// Match a declared MIME type, ignoring parameters such as `charset`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match essence.as_str() {
            MIME_PDF => Some(Self::Pdf),
            MIME_DOCX => Some(Self::Docx),
            MIME_TEXT => Some(Self::PlainText),
            _ => None,
        }
    }

    /// Guess from a file name. Used when the client declares no type or
    /// only `application/octet-stream`.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::PlainText),
            _ => None,
        }
    }

    /// Resolve the type of an upload from its declared MIME type, falling
    /// back to the file name only for generic declarations.
    pub fn detect(mime: Option<&str>, file_name: &str) -> Option<Self> {
        match mime.map(str::trim).filter(|m| !m.is_empty()) {
            Some(m) if !m.starts_with("application/octet-stream") => Self::from_mime(m),
            _ => Self::from_file_name(file_name),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => MIME_PDF,
            Self::Docx => MIME_DOCX,
            Self::PlainText => MIME_TEXT,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf => write!(f, "PDF"),
            Self::Docx => write!(f, "DOCX"),
            Self::PlainText => write!(f, "plain text"),
        }
    }
}
