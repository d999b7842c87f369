//! In-memory vector index.
//!
//! Holds every [`Chunk`] of a session together with its embedding and answers
//! nearest-neighbour queries by brute-force cosine similarity. Corpora here
//! are a handful of uploaded files, so a linear scan is fast enough and keeps
//! the index free of any external store.
//!
//! The index is immutable once built. Loading new documents builds a new
//! index; nothing is ever appended.

use std::time::Duration;

use crate::embedding::{cosine_similarity, EmbeddingProvider};
use crate::error::Error;
use crate::models::Chunk;
use crate::progress::{ProgressEvent, ProgressReporter};

/// A retrieval hit.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

#[derive(Debug, Clone)]
struct Entry {
    chunk: Chunk,
    vector: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<Entry>,
    dims: usize,
}

impl VectorIndex {
    /// Embed `chunks` in batches of `batch_size` and build the index.
    ///
    /// The provider is warmed up first without a deadline; each batch is
    /// then bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// - [`Error::IndexBuildFailure`] for an empty chunk list or vectors of
    ///   the wrong count or dimensionality.
    /// - [`Error::EmbeddingFailure`] when the provider fails or times out.
    pub async fn build(
        chunks: Vec<Chunk>,
        provider: &dyn EmbeddingProvider,
        batch_size: usize,
        timeout: Duration,
        progress: &dyn ProgressReporter,
    ) -> Result<Self, Error> {
        if chunks.is_empty() {
            return Err(Error::IndexBuildFailure("no chunks to index".into()));
        }

        provider
            .warm_up()
            .await
            .map_err(|e| Error::EmbeddingFailure(format!("{:#}", e)))?;

        let total = chunks.len();
        let batch_size = batch_size.max(1);
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(total);

        for batch in chunks.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embedded = tokio::time::timeout(timeout, provider.embed(&texts))
                .await
                .map_err(|_| {
                    Error::EmbeddingFailure(format!(
                        "embedding timed out after {:?}",
                        timeout
                    ))
                })?
                .map_err(|e| Error::EmbeddingFailure(format!("{:#}", e)))?;

            if embedded.len() != texts.len() {
                return Err(Error::IndexBuildFailure(format!(
                    "provider returned {} vectors for {} chunks",
                    embedded.len(),
                    texts.len()
                )));
            }
            vectors.extend(embedded);
            progress.report(ProgressEvent::Embedding {
                n: vectors.len() as u64,
                total: total as u64,
            });
        }

        Self::from_vectors(chunks, vectors)
    }

    /// Build from precomputed vectors, one per chunk.
    pub fn from_vectors(chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<Self, Error> {
        if chunks.is_empty() {
            return Err(Error::IndexBuildFailure("no chunks to index".into()));
        }
        if chunks.len() != vectors.len() {
            return Err(Error::IndexBuildFailure(format!(
                "{} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let dims = vectors[0].len();
        if dims == 0 {
            return Err(Error::IndexBuildFailure("embedding has zero dimensions".into()));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
            return Err(Error::IndexBuildFailure(format!(
                "dimension mismatch: expected {}, got {}",
                dims,
                bad.len()
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| Entry { chunk, vector })
            .collect();

        tracing::debug!(dims, "vector index built");
        Ok(Self { entries, dims })
    }

    /// The `k` chunks most similar to `query`, best first. Ties keep
    /// insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(query, &e.vector)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: self.entries[i].chunk.clone(),
                score,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }
}
