//! Overlapping, boundary-aware text chunker.
//!
//! Splits each [`TextRecord`] into [`Chunk`]s of at most `max_chars`
//! characters. Consecutive chunks of a record share exactly `overlap_chars`
//! characters so that a passage cut at a window edge is still retrievable
//! whole from one of its neighbours.
//!
//! # Algorithm
//!
//! 1. Work in Unicode scalar values, not bytes.
//! 2. If the rest of the record fits in one window, emit it and stop.
//! 3. Otherwise look for the coarsest separator (paragraph break, line
//!    break, sentence punctuation, comma, space) whose end falls inside
//!    `(start + overlap, start + max]`, and cut right after the last such
//!    occurrence. With no separator in range, cut at `start + max`.
//! 4. The next window starts `overlap` characters before the cut.
//!
//! Every window ends strictly after `start + overlap`, so each step advances
//! and the loop terminates even on a single enormous token.
//!
//! Chunk IDs and hashes are SHA-256 digests, so chunking the same record with
//! the same configuration is byte-for-byte reproducible.
//!
//! # Example
//!
//! ```rust
//! use docqa::chunk::Chunker;
//! use docqa::config::ChunkingConfig;
//!
//! let chunker = Chunker::new(&ChunkingConfig::default()).unwrap();
//! let pieces = chunker.split_text("Hello world.\n\nSecond paragraph.");
//! assert_eq!(pieces.len(), 1);
//! ```

use sha2::{Digest, Sha256};

use crate::config::ChunkingConfig;
use crate::error::Error;
use crate::models::{Chunk, TextRecord};

/// Split boundaries, coarsest first. The forced character cut is implicit.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", ".", "!", "?", ",", " "];

#[derive(Debug, Clone)]
pub struct Chunker {
    max_chars: usize,
    overlap_chars: usize,
    separators: Vec<Vec<char>>,
}

impl Chunker {
    pub fn new(config: &ChunkingConfig) -> Result<Self, Error> {
        if config.max_chars == 0 {
            return Err(Error::Config("chunking.max_chars must be > 0".into()));
        }
        if config.overlap_chars >= config.max_chars {
            return Err(Error::Config(
                "chunking.overlap_chars must be smaller than chunking.max_chars".into(),
            ));
        }
        Ok(Self {
            max_chars: config.max_chars,
            overlap_chars: config.overlap_chars,
            separators: DEFAULT_SEPARATORS
                .iter()
                .map(|s| s.chars().collect())
                .collect(),
        })
    }

    /// Replace the separator list (coarsest first).
    pub fn with_separators(mut self, separators: &[&str]) -> Self {
        self.separators = separators
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| s.chars().collect())
            .collect();
        self
    }

    /// Chunk every record, preserving record order.
    pub fn chunk_records(&self, records: &[TextRecord]) -> Vec<Chunk> {
        records
            .iter()
            .flat_map(|record| self.chunk_record(record))
            .collect()
    }

    pub fn chunk_record(&self, record: &TextRecord) -> Vec<Chunk> {
        self.split_text(&record.text)
            .into_iter()
            .enumerate()
            .map(|(index, (start_char, text))| make_chunk(record, index, start_char, text))
            .collect()
    }

    /// Split raw text into `(start_char, text)` windows. Blank text yields
    /// nothing.
    pub fn split_text(&self, text: &str) -> Vec<(usize, String)> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let mut windows = Vec::new();
        let mut start = 0usize;

        loop {
            if len - start <= self.max_chars {
                windows.push((start, chars[start..].iter().collect()));
                break;
            }
            let end = self.window_end(&chars, start);
            windows.push((start, chars[start..end].iter().collect()));
            start = end - self.overlap_chars;
        }

        windows
    }

    /// Cut position for a window starting at `start`. Caller guarantees the
    /// remaining text is longer than `max_chars`.
    fn window_end(&self, chars: &[char], start: usize) -> usize {
        let lo = start + self.overlap_chars + 1;
        let hi = start + self.max_chars;

        for sep in &self.separators {
            let n = sep.len();
            for end in (lo..=hi).rev() {
                if end < start + n {
                    break;
                }
                if chars[end - n..end] == sep[..] {
                    return end;
                }
            }
        }
        hi
    }
}

fn make_chunk(record: &TextRecord, index: usize, start_char: usize, text: String) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    let mut hasher = Sha256::new();
    hasher.update(record.source.as_bytes());
    hasher.update([0]);
    hasher.update(record.locator.to_string().as_bytes());
    hasher.update([0]);
    hasher.update(index.to_le_bytes());
    let id = format!("{:x}", hasher.finalize());

    Chunk {
        id,
        source: record.source.clone(),
        locator: record.locator,
        chunk_index: index,
        start_char,
        text,
        hash,
    }
}
