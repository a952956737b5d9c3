//! Embedding capability
//!
//! The pipeline treats embeddings as opaque fixed-dimension vectors. Any
//! provider implementing [`EmbeddingProvider`] can be injected; nothing else
//! in the crate depends on how the vectors are computed.

mod hashed;
mod random;

use std::sync::Arc;

use crate::config::{EmbeddingConfig, EmbeddingProviderKind};
use crate::error::{GradeError, Result};

pub use hashed::HashedEmbeddings;
pub use random::RandomEmbeddings;

/// A fixed-dimension vector for one text
pub type Embedding = Vec<f32>;

/// Text to vector capability.
///
/// Every vector a provider returns must have length [`dimension`](Self::dimension).
pub trait EmbeddingProvider: Send + Sync {
    /// Stable provider name, recorded in persisted index manifests
    fn name(&self) -> &str;

    fn dimension(&self) -> usize;

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>>;

    fn embed_query(&self, text: &str) -> Result<Embedding>;

    /// Whether the vector for a text depends on the order of earlier calls.
    /// Such providers are not reproducible under parallel scoring.
    fn order_dependent(&self) -> bool {
        false
    }
}

/// Construct the provider named in the configuration
pub fn provider_from_config(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    if config.dimension == 0 {
        return Err(GradeError::config("embedding.dimension must be greater than 0"));
    }

    let provider: Arc<dyn EmbeddingProvider> = match config.provider {
        EmbeddingProviderKind::Hashed => {
            Arc::new(HashedEmbeddings::new(config.dimension).with_stemming(config.stem))
        }
        EmbeddingProviderKind::Random => {
            tracing::warn!(
                "using random placeholder embeddings; nearest-neighbor context is not meaningful"
            );
            Arc::new(match config.seed {
                Some(seed) => RandomEmbeddings::seeded(config.dimension, seed),
                None => RandomEmbeddings::new(config.dimension),
            })
        }
    };
    Ok(provider)
}

/// Check that a provider honoured its declared dimension
pub fn ensure_dimension(provider: &dyn EmbeddingProvider, vector: &[f32]) -> Result<()> {
    if vector.len() != provider.dimension() {
        return Err(GradeError::dimension_mismatch(
            "embedding dimension",
            provider.dimension(),
            vector.len(),
        ));
    }
    Ok(())
}
