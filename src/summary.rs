//! Per-file summaries shown after processing.
//!
//! Page count and chunk count are separate metrics: a 3-page PDF may well
//! produce 7 chunks.

use std::fmt;

use crate::models::{display_name, Chunk, FileKind, IngestionResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub name: String,
    pub kind: Option<FileKind>,
    /// PDF only.
    pub pages: Option<usize>,
    pub records: usize,
    pub chunks: usize,
}

impl fmt::Display for FileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File: {}", display_name(&self.name))?;
        writeln!(
            f,
            "Type: {}",
            self.kind.map(|k| k.label()).unwrap_or("Unknown")
        )?;
        if let Some(pages) = self.pages {
            writeln!(f, "Number of pages: {}", pages)?;
        }
        writeln!(f, "Number of records: {}", self.records)?;
        write!(f, "Number of chunks: {}", self.chunks)
    }
}

/// One summary per processed file, in processing order.
pub fn summarize(result: &IngestionResult, chunks: &[Chunk]) -> Vec<FileSummary> {
    result
        .processed
        .iter()
        .map(|name| {
            let kind = crate::models::extension_of(name)
                .as_deref()
                .and_then(FileKind::from_extension);
            let records = result.records.iter().filter(|r| &r.source == name).count();
            FileSummary {
                name: name.clone(),
                kind,
                pages: (kind == Some(FileKind::Pdf)).then_some(records),
                records,
                chunks: chunks.iter().filter(|c| &c.source == name).count(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Locator, TextRecord};

    fn rec(source: &str, locator: Locator) -> TextRecord {
        TextRecord {
            source: source.to_string(),
            locator,
            text: "text".to_string(),
        }
    }

    fn chunk(source: &str, i: usize) -> Chunk {
        Chunk {
            id: format!("{}-{}", source, i),
            source: source.to_string(),
            locator: Locator::Whole,
            chunk_index: i,
            start_char: 0,
            text: "text".to_string(),
            hash: String::new(),
        }
    }

    #[test]
    fn pages_and_chunks_are_distinct() {
        let result = IngestionResult {
            records: vec![
                rec("docs/report.pdf", Locator::Page(1)),
                rec("docs/report.pdf", Locator::Page(2)),
                rec("docs/report.pdf", Locator::Page(3)),
                rec("notes.txt", Locator::Whole),
            ],
            processed: vec!["docs/report.pdf".to_string(), "notes.txt".to_string()],
            failed: Vec::new(),
        };
        let chunks: Vec<Chunk> = (0..7)
            .map(|i| chunk("docs/report.pdf", i))
            .chain(std::iter::once(chunk("notes.txt", 0)))
            .collect();

        let summaries = summarize(&result, &chunks);
        assert_eq!(summaries[0].pages, Some(3));
        assert_eq!(summaries[0].chunks, 7);
        assert_eq!(summaries[1].pages, None);
        assert_eq!(summaries[1].chunks, 1);

        let text = summaries[0].to_string();
        assert!(text.starts_with("File: report.pdf\nType: PDF\n"));
        assert!(text.contains("Number of pages: 3"));
        assert!(text.contains("Number of chunks: 7"));
        assert!(!summaries[1].to_string().contains("pages"));
    }
}
