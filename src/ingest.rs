//! Ingestion pipeline.
//!
//! Runs the selected [`Loader`] over each uploaded file, validates the
//! output and splits the batch into processed and failed files. A failing
//! file never affects the others; only a batch with no usable text at all is
//! an error.

use crate::error::{Error, LoadError};
use crate::loader::Loader;
use crate::models::{FileFailure, IngestionResult, SourceFile, TextRecord};
use crate::progress::{ProgressEvent, ProgressReporter};

/// Pages with fewer trimmed characters than this count as blank.
pub const MIN_PDF_PAGE_CHARS: usize = 10;

/// Ingest a batch of files.
///
/// # Errors
///
/// [`Error::NoValidDocuments`] when no file produced any record. The error
/// carries the per-file failures so they can still be reported.
pub fn ingest(
    files: &[SourceFile],
    progress: &dyn ProgressReporter,
) -> Result<IngestionResult, Error> {
    ingest_with(files, Vec::new(), progress)
}

/// Like [`ingest`], with failures that happened before parsing (for example
/// unreadable uploads) folded into the batch accounting.
pub fn ingest_with(
    files: &[SourceFile],
    unreadable: Vec<FileFailure>,
    progress: &dyn ProgressReporter,
) -> Result<IngestionResult, Error> {
    let mut result = IngestionResult {
        failed: unreadable,
        ..Default::default()
    };
    let total = files.len() as u64;

    for (i, file) in files.iter().enumerate() {
        progress.report(ProgressEvent::Loading {
            file: file.name.clone(),
            n: i as u64 + 1,
            total,
        });

        match load_file(file) {
            Ok(records) => {
                tracing::debug!(file = %file.name, records = records.len(), "file ingested");
                result.records.extend(records);
                result.processed.push(file.name.clone());
            }
            Err(reason) => {
                tracing::warn!(file = %file.name, %reason, "file rejected");
                result.failed.push(FileFailure {
                    file: file.name.clone(),
                    reason,
                });
            }
        }
    }

    if result.records.is_empty() {
        return Err(Error::NoValidDocuments {
            failed: result.failed,
        });
    }

    tracing::info!(
        processed = result.processed.len(),
        failed = result.failed.len(),
        records = result.records.len(),
        "ingestion complete"
    );
    Ok(result)
}

/// Select, run and validate the loader for a single file.
pub fn load_file(file: &SourceFile) -> Result<Vec<TextRecord>, LoadError> {
    let loader = Loader::for_path(&file.name)?;
    let records = loader.load(file)?;

    if records.is_empty() {
        return Err(LoadError::EmptyDocument);
    }
    if loader == Loader::Pdf && looks_corrupt(&records) {
        return Err(LoadError::CorruptPdf);
    }
    Ok(records)
}

/// True when every page is effectively blank (scanned or image-only PDFs).
pub fn looks_corrupt(pages: &[TextRecord]) -> bool {
    pages
        .iter()
        .all(|p| p.text.trim().chars().count() < MIN_PDF_PAGE_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Locator;
    use crate::progress::NoProgress;
    use std::collections::HashSet;

    fn file(name: &str, body: &str) -> SourceFile {
        SourceFile::new(name, body.as_bytes().to_vec())
    }

    fn page(n: u32, text: &str) -> TextRecord {
        TextRecord {
            source: "scan.pdf".to_string(),
            locator: Locator::Page(n),
            text: text.to_string(),
        }
    }

    #[test]
    fn mixed_batch_accounts_for_every_file() {
        let files = vec![
            file("good.txt", "Some useful content."),
            file("slides.pptx", "whatever"),
            file("empty.txt", ""),
            file("rows.csv", "a,b\n1,2\n"),
            file("broken.json", "{"),
        ];
        let result = ingest(&files, &NoProgress).unwrap();

        assert_eq!(result.processed, vec!["good.txt", "rows.csv"]);
        assert_eq!(result.failed.len(), 3);

        let processed: HashSet<&str> = result.processed.iter().map(String::as_str).collect();
        let failed: HashSet<&str> = result.failed.iter().map(|f| f.file.as_str()).collect();
        assert!(processed.is_disjoint(&failed));
        let all: HashSet<&str> = processed.union(&failed).copied().collect();
        let input: HashSet<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(all, input);
    }

    #[test]
    fn failure_reasons() {
        let files = vec![
            file("ok.txt", "content"),
            file("slides.pptx", "x"),
            file("empty.txt", ""),
        ];
        let result = ingest(&files, &NoProgress).unwrap();
        assert_eq!(
            result.failed[0].reason,
            LoadError::UnsupportedFileType {
                extension: ".pptx".to_string()
            }
        );
        assert_eq!(result.failed[1].reason, LoadError::EmptyDocument);
        assert_eq!(result.failed[1].reason.to_string(), "Empty document");
    }

    #[test]
    fn only_empty_file_fails_the_batch() {
        let err = ingest(&[file("empty.txt", "")], &NoProgress).unwrap_err();
        match err {
            Error::NoValidDocuments { failed } => {
                assert_eq!(failed.len(), 1);
                assert_eq!(failed[0].reason, LoadError::EmptyDocument);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn blank_json_is_an_empty_document() {
        let files = vec![file("blank.json", r#"[""]"#), file("notes.txt", "content")];
        let result = ingest(&files, &NoProgress).unwrap();
        assert_eq!(result.processed, vec!["notes.txt"]);
        assert_eq!(result.failed[0].file, "blank.json");
        assert_eq!(result.failed[0].reason, LoadError::EmptyDocument);

        let err = ingest(&[file("blank.json", r#"["", "  "]"#)], &NoProgress).unwrap_err();
        assert!(matches!(err, Error::NoValidDocuments { .. }));
    }

    #[test]
    fn records_keep_input_order() {
        let files = vec![file("b.txt", "second"), file("a.txt", "first")];
        let result = ingest(&files, &NoProgress).unwrap();
        assert_eq!(result.records[0].text, "second");
        assert_eq!(result.records[1].text, "first");
    }

    #[test]
    fn unreadable_uploads_are_reported() {
        let unreadable = vec![FileFailure {
            file: "gone.txt".to_string(),
            reason: LoadError::Read("permission denied".to_string()),
        }];
        let result = ingest_with(&[file("ok.txt", "content")], unreadable, &NoProgress).unwrap();
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.processed, vec!["ok.txt"]);
    }

    #[test]
    fn blank_pages_look_corrupt() {
        assert!(looks_corrupt(&[page(1, ""), page(2, "   abc   "), page(3, "\n123456789\n")]));
        assert!(!looks_corrupt(&[page(1, ""), page(2, "0123456789")]));
    }
}
