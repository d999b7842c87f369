//! File-type selection and text extraction.
//!
//! [`Loader`] is a closed set of parsers, one per supported extension.
//! Selection is pure ([`Loader::for_path`]); parsing happens in
//! [`Loader::load`], which never panics and reports failures as
//! [`LoadError`] so the ingestion batch can carry on.

use serde_json::Value;

use crate::error::LoadError;
use crate::models::{extension_of, FileKind, Locator, SourceFile, TextRecord};

/// A parser for one supported document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loader {
    Pdf,
    Text,
    Csv,
    Json,
}

impl Loader {
    /// Pick the loader for a file name by its extension.
    pub fn for_path(name: &str) -> Result<Self, LoadError> {
        let ext = extension_of(name);
        match ext.as_deref().and_then(FileKind::from_extension) {
            Some(kind) => Ok(Self::for_kind(kind)),
            None => Err(LoadError::UnsupportedFileType {
                extension: ext.unwrap_or_else(|| "(none)".to_string()),
            }),
        }
    }

    pub fn for_kind(kind: FileKind) -> Self {
        match kind {
            FileKind::Pdf => Loader::Pdf,
            FileKind::Text => Loader::Text,
            FileKind::Csv => Loader::Csv,
            FileKind::Json => Loader::Json,
        }
    }

    /// Parse a file into records. Zero records is a valid outcome here;
    /// the ingestion pipeline decides what an empty result means.
    pub fn load(&self, file: &SourceFile) -> Result<Vec<TextRecord>, LoadError> {
        let texts = match self {
            Loader::Pdf => load_pdf(&file.bytes)?,
            Loader::Text => load_text(&file.bytes)?,
            Loader::Csv => load_csv(&file.bytes)?,
            Loader::Json => load_json(&file.bytes)?,
        };
        Ok(texts
            .into_iter()
            .map(|(locator, text)| TextRecord {
                source: file.name.clone(),
                locator,
                text,
            })
            .collect())
    }
}

fn load_pdf(bytes: &[u8]) -> Result<Vec<(Locator, String)>, LoadError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| LoadError::Load(e.to_string()))?;
    let mut out = Vec::new();
    for page_num in doc.get_pages().into_keys() {
        // Undecodable pages count as blank; the corrupt-content check catches
        // documents where nothing could be read.
        let text = match doc.extract_text(&[page_num]) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(page = page_num, error = %e, "PDF page text extraction failed");
                String::new()
            }
        };
        out.push((Locator::Page(page_num), text));
    }
    Ok(out)
}

fn load_text(bytes: &[u8]) -> Result<Vec<(Locator, String)>, LoadError> {
    let text = std::str::from_utf8(bytes).map_err(|e| LoadError::Load(e.to_string()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![(Locator::Whole, text.to_string())])
}

fn load_csv(bytes: &[u8]) -> Result<Vec<(Locator, String)>, LoadError> {
    let mut reader = csv::ReaderBuilder::new().from_reader(bytes);
    let headers = reader
        .headers()
        .map_err(|e| LoadError::Load(e.to_string()))?
        .clone();

    let mut out = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| LoadError::Load(e.to_string()))?;
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        let text = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| format!("{}: {}", h.trim(), v.trim()))
            .collect::<Vec<_>>()
            .join("\n");
        out.push((Locator::Row(row), text));
    }
    Ok(out)
}

fn load_json(bytes: &[u8]) -> Result<Vec<(Locator, String)>, LoadError> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Vec::new());
    }
    let value: Value = serde_json::from_slice(bytes).map_err(|e| LoadError::Load(e.to_string()))?;
    let texts = match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| Ok((Locator::Element(i), json_text(item)?)))
            .collect::<Result<Vec<_>, LoadError>>()?,
        other => vec![(Locator::Whole, json_text(other)?)],
    };
    // Blank strings carry nothing to index; element numbers keep their
    // position in the source array.
    Ok(texts
        .into_iter()
        .filter(|(_, text)| !text.trim().is_empty())
        .collect())
}

fn json_text(value: Value) -> Result<String, LoadError> {
    match value {
        Value::String(s) => Ok(s),
        other => serde_json::to_string_pretty(&other).map_err(|e| LoadError::Load(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, body: &str) -> SourceFile {
        SourceFile::new(name, body.as_bytes().to_vec())
    }

    #[test]
    fn selects_by_extension() {
        assert_eq!(Loader::for_path("a.pdf").unwrap(), Loader::Pdf);
        assert_eq!(Loader::for_path("dir/b.TXT").unwrap(), Loader::Text);
        assert_eq!(Loader::for_path("c.csv").unwrap(), Loader::Csv);
        assert_eq!(Loader::for_path("d.json").unwrap(), Loader::Json);
    }

    #[test]
    fn unsupported_extension_is_named() {
        let err = Loader::for_path("slides.docx").unwrap_err();
        assert_eq!(
            err,
            LoadError::UnsupportedFileType {
                extension: ".docx".to_string()
            }
        );
        let err = Loader::for_path("Makefile").unwrap_err();
        assert!(err.to_string().contains("(none)"));
    }

    #[test]
    fn text_yields_single_whole_record() {
        let records = Loader::Text.load(&file("n.txt", "hello there")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].locator, Locator::Whole);
        assert_eq!(records[0].source, "n.txt");
        assert_eq!(records[0].text, "hello there");
    }

    #[test]
    fn empty_text_yields_no_records() {
        assert!(Loader::Text.load(&file("e.txt", "")).unwrap().is_empty());
        assert!(Loader::Text.load(&file("e.txt", " \n\t")).unwrap().is_empty());
    }

    #[test]
    fn invalid_utf8_is_a_load_error() {
        let f = SourceFile::new("bad.txt", vec![0xff, 0xfe, 0xfd]);
        let err = Loader::Text.load(&f).unwrap_err();
        assert!(matches!(err, LoadError::Load(_)));
    }

    #[test]
    fn csv_rows_become_records() {
        let f = file("people.csv", "name,city\nAda,London\nGrace,Arlington\n");
        let records = Loader::Csv.load(&f).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "name: Ada\ncity: London");
        assert_eq!(records[1].locator, Locator::Row(1));
    }

    #[test]
    fn header_only_csv_is_empty() {
        assert!(Loader::Csv.load(&file("h.csv", "a,b\n")).unwrap().is_empty());
    }

    #[test]
    fn ragged_csv_is_a_load_error() {
        let err = Loader::Csv.load(&file("r.csv", "a,b\n1,2,3\n")).unwrap_err();
        assert!(matches!(err, LoadError::Load(_)));
    }

    #[test]
    fn json_array_elements_become_records() {
        let f = file("items.json", r#"["plain", {"k": 1}]"#);
        let records = Loader::Json.load(&f).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "plain");
        assert_eq!(records[1].locator, Locator::Element(1));
        assert!(records[1].text.contains("\"k\": 1"));
    }

    #[test]
    fn json_object_is_one_record() {
        let records = Loader::Json.load(&file("o.json", r#"{"title": "x"}"#)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].locator, Locator::Whole);
    }

    #[test]
    fn invalid_json_is_a_load_error() {
        let err = Loader::Json.load(&file("bad.json", "{not json")).unwrap_err();
        assert!(matches!(err, LoadError::Load(_)));
    }

    #[test]
    fn blank_json_is_empty() {
        assert!(Loader::Json.load(&file("e.json", "")).unwrap().is_empty());
    }

    #[test]
    fn blank_json_strings_are_dropped() {
        assert!(Loader::Json.load(&file("b.json", r#"[""]"#)).unwrap().is_empty());
        assert!(Loader::Json.load(&file("b.json", r#"["", "  "]"#)).unwrap().is_empty());
        assert!(Loader::Json.load(&file("b.json", r#""   ""#)).unwrap().is_empty());

        let records = Loader::Json.load(&file("m.json", r#"["", "kept"]"#)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].locator, Locator::Element(1));
    }

    #[test]
    fn blank_csv_rows_are_dropped() {
        let f = file("gaps.csv", "name,city\n,\nAda,London\n , \n");
        let records = Loader::Csv.load(&f).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].locator, Locator::Row(1));
        assert!(Loader::Csv.load(&file("blank.csv", "a,b\n,\n")).unwrap().is_empty());
    }

    #[test]
    fn invalid_pdf_is_a_load_error() {
        let err = Loader::Pdf.load(&file("x.pdf", "not a pdf")).unwrap_err();
        assert!(matches!(err, LoadError::Load(_)));
    }
}
