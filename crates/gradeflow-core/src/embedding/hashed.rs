use sha2::{Digest, Sha256};

use super::{Embedding, EmbeddingProvider};
use crate::error::Result;
use crate::text::tokenize_with_stemming;

/// Deterministic bag-of-words provider using signed feature hashing.
///
/// Each token is hashed with SHA-256; the first eight bytes pick a bucket and
/// the ninth picks a sign. Vectors are L2-normalized. Texts sharing
/// identifiers land close together, which is enough for contextual lookup
/// without a model, and the output is identical on every machine.
pub struct HashedEmbeddings {
    dimension: usize,
    stem: bool,
}

impl HashedEmbeddings {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            stem: true,
        }
    }

    pub fn with_stemming(mut self, stem: bool) -> Self {
        self.stem = stem;
        self
    }

    fn embed(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.dimension];
        if self.dimension == 0 {
            return vector;
        }

        for token in tokenize_with_stemming(text, self.stem) {
            let digest = Sha256::digest(token.as_bytes());
            let bucket = digest
                .iter()
                .take(8)
                .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[(bucket % self.dimension as u64) as usize] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl EmbeddingProvider for HashedEmbeddings {
    fn name(&self) -> &str {
        "hashed"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|text| self.embed(text)).collect())
    }

    fn embed_query(&self, text: &str) -> Result<Embedding> {
        Ok(self.embed(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_deterministic() {
        let provider = HashedEmbeddings::new(64);
        let a = provider.embed_query("function App() {}").unwrap();
        let b = provider.embed_query("function App() {}").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_unit_length() {
        let provider = HashedEmbeddings::new(64);
        let v = provider.embed_query("TodoList renders items").unwrap();
        let norm = dot(&v, &v).sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_no_tokens_gives_zero_vector() {
        let provider = HashedEmbeddings::new(16);
        let v = provider.embed_query("{ } ( ) ;").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_shared_identifiers_are_closer() {
        let provider = HashedEmbeddings::new(256);
        let query = provider.embed_query("<TodoList todos={todos} />").unwrap();
        let related = provider
            .embed_query("function TodoList({ todos }) { return todos.map(renderTodo); }")
            .unwrap();
        let unrelated = provider
            .embed_query("footer copyright year company name")
            .unwrap();
        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[test]
    fn test_batch_matches_query() {
        let provider = HashedEmbeddings::new(32);
        let batch = provider.embed_batch(&["alpha beta", "gamma"]).unwrap();
        assert_eq!(batch[0], provider.embed_query("alpha beta").unwrap());
        assert_eq!(batch[1], provider.embed_query("gamma").unwrap());
    }
}
