//! Exact nearest-neighbor index over reference chunk embeddings
//!
//! The index is built once from a batch of chunks and their vectors, then
//! only read. Similarity is cosine: vectors are L2-normalized when the index
//! is built and queries are normalized before comparison, so the score is a
//! dot product. Results are ordered by descending similarity with ties broken
//! by ascending id.

mod persist;

use std::cmp::Ordering;

use crate::chunk::Chunk;
use crate::embedding::{ensure_dimension, Embedding, EmbeddingProvider};
use crate::error::{GradeError, Result};

pub use persist::{IndexManifest, Trust, INDEX_FORMAT_VERSION};

/// Name of the similarity metric, recorded in persisted manifests
pub const METRIC: &str = "cosine";

/// One stored vector with the chunk it was computed from
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// Insertion-order id
    pub id: usize,
    pub vector: Embedding,
    pub chunk: Chunk,
}

/// A query hit
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor<'a> {
    pub id: usize,
    /// Cosine similarity in `[-1, 1]`
    pub similarity: f32,
    pub chunk: &'a Chunk,
}

/// Immutable id -> (vector, chunk) store answering k-NN queries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorIndex {
    dimension: usize,
    entries: Vec<IndexEntry>,
    provider: Option<String>,
}

impl VectorIndex {
    /// Build an index from chunks and their embeddings, paired by position.
    ///
    /// Fails with `DimensionMismatch` when the counts differ or vectors have
    /// different lengths.
    pub fn build(chunks: Vec<Chunk>, embeddings: Vec<Embedding>) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            return Err(GradeError::dimension_mismatch(
                "embedding count",
                chunks.len(),
                embeddings.len(),
            ));
        }

        let dimension = embeddings.first().map_or(0, Vec::len);
        if !embeddings.is_empty() && dimension == 0 {
            return Err(GradeError::InvalidEmbedding {
                reason: "vectors must have at least one component".to_string(),
            });
        }

        let mut entries = Vec::with_capacity(chunks.len());
        for (id, (chunk, vector)) in chunks.into_iter().zip(embeddings).enumerate() {
            if vector.len() != dimension {
                return Err(GradeError::dimension_mismatch(
                    "vector dimension",
                    dimension,
                    vector.len(),
                ));
            }
            ensure_finite(&vector, id)?;
            entries.push(IndexEntry {
                id,
                vector: normalized(vector),
                chunk,
            });
        }

        tracing::debug!(entries = entries.len(), dimension, "built vector index");
        Ok(Self {
            dimension,
            entries,
            provider: None,
        })
    }

    /// Embed every chunk with `provider` and build the index
    pub fn embed_and_build(provider: &dyn EmbeddingProvider, chunks: Vec<Chunk>) -> Result<Self> {
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = provider.embed_batch(&texts)?;

        for vector in &embeddings {
            ensure_dimension(provider, vector)?;
        }

        let mut index = Self::build(chunks, embeddings)?;
        index.provider = Some(provider.name().to_string());
        Ok(index)
    }

    /// Vector dimension, 0 for an empty index
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name of the provider that produced the vectors, when known
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Return the `min(k, len)` most similar entries.
    ///
    /// An empty index or `k == 0` yields no results. A query whose length
    /// differs from the index dimension is a `DimensionMismatch`.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor<'_>>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if vector.len() != self.dimension {
            return Err(GradeError::dimension_mismatch(
                "query dimension",
                self.dimension,
                vector.len(),
            ));
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(GradeError::InvalidEmbedding {
                reason: "query vector contains non-finite values".to_string(),
            });
        }

        let query = normalized(vector.to_vec());
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .map(|entry| (entry.id, dot(&query, &entry.vector)))
            .collect();

        scored.sort_by(|a, b| by_similarity(a.1, b.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(id, similarity)| Neighbor {
                id,
                similarity,
                chunk: &self.entries[id].chunk,
            })
            .collect())
    }

    /// Embed `text` with `provider` and query
    pub fn query_text(
        &self,
        provider: &dyn EmbeddingProvider,
        text: &str,
        k: usize,
    ) -> Result<Vec<Neighbor<'_>>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let vector = provider.embed_query(text)?;
        self.query(&vector, k)
    }
}

/// Descending similarity. Values are finite, so `-0.0` and `0.0` tie.
fn by_similarity(a: f32, b: f32) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn normalized(mut vector: Embedding) -> Embedding {
    let norm = dot(&vector, &vector).sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
    vector
}

fn ensure_finite(vector: &[f32], id: usize) -> Result<()> {
    if vector.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(GradeError::InvalidEmbedding {
            reason: format!("vector {} contains non-finite values", id),
        })
    }
}

#[cfg(test)]
mod tests;
