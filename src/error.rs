//! Error taxonomy for the ingestion and answering pipeline.
//!
//! Two layers:
//!
//! - [`LoadError`] describes why a single file could not be ingested. These
//!   are recovered inside the batch and reported next to the successes.
//! - [`Error`] is terminal for the operation that raised it (a whole batch,
//!   an index build, one question).

use thiserror::Error;

use crate::models::FileFailure;

/// Why one file was rejected during ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Unsupported file type: {extension}")]
    UnsupportedFileType { extension: String },

    /// Parser failure; the message is the underlying cause.
    #[error("{0}")]
    Load(String),

    #[error("Empty document")]
    EmptyDocument,

    #[error("PDF content appears to be invalid or corrupted")]
    CorruptPdf,

    /// The upload itself could not be read from disk.
    #[error("failed to read file: {0}")]
    Read(String),
}

/// Terminal failures surfaced to the caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("No valid documents were processed. Please check your files.")]
    NoValidDocuments { failed: Vec<FileFailure> },

    #[error("embedding failed: {0}")]
    EmbeddingFailure(String),

    #[error("index build failed: {0}")]
    IndexBuildFailure(String),

    #[error("Error generating response: {0}")]
    GenerationFailure(String),

    #[error("{var} not found in environment variables")]
    MissingCredential { var: String },

    #[error("Please upload and process documents first!")]
    NotReady,

    #[error("invalid configuration: {0}")]
    Config(String),
}
