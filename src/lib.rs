//! # docqa
//!
//! Chat with your documents. Upload PDF, text, CSV or JSON files; docqa
//! extracts their text, splits it into overlapping chunks, embeds the chunks
//! into an in-memory vector index and answers questions with an LLM grounded
//! on the most relevant chunks, keeping the conversation history.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐
//! │  Loader  │──▶│  Ingest  │──▶│  Chunker │──▶│  Index   │
//! │ PDF/TXT/ │   │ validate │   │ overlap  │   │ embed +  │
//! │ CSV/JSON │   │ + report │   │ windows  │   │ cosine   │
//! └──────────┘   └──────────┘   └──────────┘   └────┬─────┘
//!                                                   │
//!                                              ┌────▼─────┐
//!                                              │ Session  │──▶ LLM
//!                                              │ history  │
//!                                              └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docqa ingest report.pdf notes.txt          # summaries only
//! docqa ask --question "What is the deadline?" report.pdf
//! docqa chat ./docs                           # interactive session
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Per-file and terminal error types |
//! | [`loader`] | Extension-based loader selection and parsing |
//! | [`ingest`] | Batch ingestion with per-file accounting |
//! | [`chunk`] | Overlapping text chunking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | In-memory vector index |
//! | [`llm`] | Chat-model clients |
//! | [`session`] | Answering session and chat lifecycle |
//! | [`qa_log`] | Append-only Q&A log |
//! | [`summary`] | Per-file summaries |
//! | [`files`] | Reading uploads from disk |
//! | [`progress`] | Progress reporting |
//! | [`commands`] | CLI command implementations |

pub mod chunk;
pub mod commands;
pub mod config;
pub mod embedding;
pub mod error;
pub mod files;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod loader;
pub mod models;
pub mod progress;
pub mod qa_log;
pub mod session;
pub mod summary;
