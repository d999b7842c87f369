//! Append-only question/answer log.
//!
//! Every successful answer is appended to a plain-text file as a
//! fixed-format record:
//!
//! ```text
//!
//! ================================================================================
//! Timestamp: 2026-03-01 14:02:11
//! Files: report.pdf, notes.txt
//! Question: What is the deadline?
//! Answer: March 31.
//! ================================================================================
//! ```
//!
//! Logging is best effort. [`QaLog::record_detached`] writes on a blocking
//! worker and reports failures through `tracing` only.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};

const RULE_WIDTH: usize = 80;

#[derive(Debug, Clone, PartialEq)]
pub struct QaRecord {
    pub timestamp: DateTime<Local>,
    pub files: Vec<String>,
    pub question: String,
    pub answer: String,
}

impl QaRecord {
    pub fn now(files: Vec<String>, question: &str, answer: &str) -> Self {
        Self {
            timestamp: Local::now(),
            files,
            question: question.to_string(),
            answer: answer.to_string(),
        }
    }
}

pub fn format_record(record: &QaRecord) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!(
        "\n{rule}\nTimestamp: {}\nFiles: {}\nQuestion: {}\nAnswer: {}\n{rule}\n",
        record.timestamp.format("%Y-%m-%d %H:%M:%S"),
        record.files.join(", "),
        record.question,
        record.answer,
    )
}

#[derive(Debug, Clone)]
pub struct QaLog {
    path: PathBuf,
}

impl QaLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, creating the file if needed.
    pub fn append(&self, record: &QaRecord) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(format_record(record).as_bytes())
    }

    /// Append on a blocking worker without waiting for it.
    pub fn record_detached(self: &Arc<Self>, record: QaRecord) -> tokio::task::JoinHandle<()> {
        let log = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            if let Err(e) = log.append(&record) {
                tracing::warn!(path = %log.path.display(), error = %e, "failed to write Q&A log");
            }
        })
    }
}
