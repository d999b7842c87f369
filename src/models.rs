//! Core data models used throughout docqa.
//!
//! These types represent the uploaded files, extracted records, chunks and
//! conversation turns that flow through the ingestion and answering pipeline.

use std::fmt;

use crate::error::LoadError;

/// Recognized document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Pdf,
    Text,
    Csv,
    Json,
}

impl FileKind {
    /// Map a lowercase extension (with leading dot) to a kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            ".pdf" => Some(FileKind::Pdf),
            ".txt" => Some(FileKind::Text),
            ".csv" => Some(FileKind::Csv),
            ".json" => Some(FileKind::Json),
            _ => None,
        }
    }

    /// Human label used in summaries.
    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Pdf => "PDF",
            FileKind::Text => "Text",
            FileKind::Csv => "CSV",
            FileKind::Json => "JSON",
        }
    }
}

/// An uploaded file: its identifier and raw bytes.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Lowercased extension including the dot, or `None` if the name has none.
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.name)
    }
}

/// Lowercased extension of a file name, including the leading dot.
pub fn extension_of(name: &str) -> Option<String> {
    std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
}

/// Position of a record inside its source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locator {
    Whole,
    /// 1-based PDF page.
    Page(u32),
    /// 0-based CSV data row.
    Row(usize),
    /// 0-based JSON array element.
    Element(usize),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Whole => write!(f, "whole"),
            Locator::Page(n) => write!(f, "page {}", n),
            Locator::Row(n) => write!(f, "row {}", n),
            Locator::Element(n) => write!(f, "element {}", n),
        }
    }
}

/// A unit of extracted text plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRecord {
    pub source: String,
    pub locator: Locator,
    pub text: String,
}

/// A file that could not be ingested, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub file: String,
    pub reason: LoadError,
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", display_name(&self.file), self.reason)
    }
}

/// Outcome of ingesting a batch of files.
#[derive(Debug, Clone, Default)]
pub struct IngestionResult {
    pub records: Vec<TextRecord>,
    pub processed: Vec<String>,
    pub failed: Vec<FileFailure>,
}

/// A bounded slice of a record's text, used as the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: String,
    pub source: String,
    pub locator: Locator,
    pub chunk_index: usize,
    /// Offset of the first character within the record text.
    pub start_char: usize,
    pub text: String,
    pub hash: String,
}

/// One answered question with the chunks that grounded it.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
    pub grounding: Vec<Chunk>,
}

/// The base name of a path-like identifier, for display.
pub fn display_name(name: &str) -> &str {
    std::path::Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name)
}
