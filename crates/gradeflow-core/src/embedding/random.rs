use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Embedding, EmbeddingProvider};
use crate::error::{GradeError, Result};

/// Placeholder provider drawing every component uniformly from `[0, 1)`.
///
/// The vectors carry no information about the text, so neighbors retrieved
/// with them are arbitrary. It exists to exercise the pipeline mechanically
/// and must not be used where retrieved context matters.
pub struct RandomEmbeddings {
    dimension: usize,
    rng: Mutex<StdRng>,
}

impl RandomEmbeddings {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible sequence of vectors for a given seed.
    ///
    /// Vectors are drawn in call order from one shared generator, so the
    /// sequence only repeats when texts are embedded in the same order. With
    /// more than one scoring worker the query vectors differ between runs.
    pub fn seeded(dimension: usize, seed: u64) -> Self {
        Self {
            dimension,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn next_vector(&self, rng: &mut StdRng) -> Embedding {
        (0..self.dimension).map(|_| rng.gen::<f32>()).collect()
    }
}

impl EmbeddingProvider for RandomEmbeddings {
    fn name(&self) -> &str {
        "random"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|e| GradeError::embedding(self.name(), e))?;
        Ok(texts.iter().map(|_| self.next_vector(&mut rng)).collect())
    }

    fn embed_query(&self, _text: &str) -> Result<Embedding> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|e| GradeError::embedding(self.name(), e))?;
        Ok(self.next_vector(&mut rng))
    }

    fn order_dependent(&self) -> bool {
        true
    }
}
