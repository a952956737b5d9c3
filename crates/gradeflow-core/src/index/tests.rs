use super::*;
use crate::document::Origin;
use crate::embedding::HashedEmbeddings;
use crate::error::GradeError;
use std::fs;
use tempfile::tempdir;

fn chunk(ordinal: usize, text: &str) -> Chunk {
    Chunk {
        ordinal,
        origin: Origin::Instructor,
        source: "App.jsx".to_string(),
        text: text.to_string(),
        overlap: 0,
        offset: 0,
    }
}

fn three_entry_index() -> VectorIndex {
    VectorIndex::build(
        vec![chunk(0, "a"), chunk(1, "b"), chunk(2, "c")],
        vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]],
    )
    .unwrap()
}

#[test]
fn test_query_with_k_larger_than_index_returns_all() {
    let index = three_entry_index();
    let hits = index.query(&[1.0, 0.0], 5).unwrap();
    assert_eq!(hits.len(), 3);
}

#[test]
fn test_query_orders_by_descending_similarity() {
    let index = three_entry_index();
    let hits = index.query(&[1.0, 0.1], 3).unwrap();
    let ids: Vec<usize> = hits.iter().map(|h| h.id).collect();
    assert_eq!(ids, vec![0, 2, 1]);
    assert!(hits[0].similarity >= hits[1].similarity);
    assert!(hits[1].similarity >= hits[2].similarity);
    assert_eq!(hits[0].chunk.text, "a");
}

#[test]
fn test_ties_broken_by_ascending_id() {
    let index = VectorIndex::build(
        vec![chunk(0, "x"), chunk(1, "y"), chunk(2, "z")],
        vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![2.0, 0.0]],
    )
    .unwrap();

    let hits = index.query(&[3.0, 0.0], 2).unwrap();
    assert_eq!(hits[0].id, 1);
    assert_eq!(hits[1].id, 2);
}

#[test]
fn test_zero_k_and_empty_index_return_nothing() {
    let index = three_entry_index();
    assert!(index.query(&[1.0, 0.0], 0).unwrap().is_empty());

    let empty = VectorIndex::build(Vec::new(), Vec::new()).unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.dimension(), 0);
    assert!(empty.query(&[1.0, 2.0, 3.0], 3).unwrap().is_empty());
}

#[test]
fn test_query_dimension_mismatch() {
    let index = three_entry_index();
    let err = index.query(&[1.0, 0.0, 0.0], 1).unwrap_err();
    assert!(matches!(err, GradeError::DimensionMismatch { .. }));
}

#[test]
fn test_build_rejects_inconsistent_input() {
    let err = VectorIndex::build(vec![chunk(0, "a")], Vec::new()).unwrap_err();
    assert!(matches!(err, GradeError::DimensionMismatch { .. }));

    let err = VectorIndex::build(
        vec![chunk(0, "a"), chunk(1, "b")],
        vec![vec![1.0, 0.0], vec![1.0]],
    )
    .unwrap_err();
    assert!(matches!(err, GradeError::DimensionMismatch { .. }));

    let err = VectorIndex::build(vec![chunk(0, "a")], vec![vec![f32::NAN, 1.0]]).unwrap_err();
    assert!(matches!(err, GradeError::InvalidEmbedding { .. }));
}

#[test]
fn test_embed_and_build_records_provider() {
    let provider = HashedEmbeddings::new(32);
    let index = VectorIndex::embed_and_build(
        &provider,
        vec![chunk(0, "function App"), chunk(1, "export default")],
    )
    .unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index.dimension(), 32);
    assert_eq!(index.provider(), Some("hashed"));

    let hits = index.query_text(&provider, "function App", 1).unwrap();
    assert_eq!(hits[0].id, 0);
}

/// Provider that declares one dimension and returns another
struct ShortVectors;

impl EmbeddingProvider for ShortVectors {
    fn name(&self) -> &str {
        "short"
    }

    fn dimension(&self) -> usize {
        4
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
    }

    fn embed_query(&self, _text: &str) -> Result<Embedding> {
        Ok(vec![1.0, 0.0, 0.0])
    }
}

#[test]
fn test_embed_and_build_rejects_wrong_provider_dimension() {
    let err = VectorIndex::embed_and_build(&ShortVectors, vec![chunk(0, "a")]).unwrap_err();
    assert!(matches!(
        err,
        GradeError::DimensionMismatch {
            expected: 4,
            found: 3,
            ..
        }
    ));
}

#[test]
fn test_save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let index = three_entry_index();

    let manifest = index.save(dir.path()).unwrap();
    assert_eq!(manifest.count, 3);
    assert_eq!(manifest.dimension, 2);
    assert_eq!(manifest.version, INDEX_FORMAT_VERSION);

    let loaded = VectorIndex::load(dir.path(), Trust::Acknowledged).unwrap();
    assert_eq!(loaded, index);
    assert_eq!(VectorIndex::read_manifest(dir.path()).unwrap(), manifest);
}

#[test]
fn test_load_missing_path_is_index_load_error() {
    let dir = tempdir().unwrap();
    let err = VectorIndex::load(&dir.path().join("nope"), Trust::Acknowledged).unwrap_err();
    assert!(matches!(err, GradeError::IndexLoad { .. }));
}

#[test]
fn test_load_refuses_unverified_source() {
    let dir = tempdir().unwrap();
    three_entry_index().save(dir.path()).unwrap();

    let err = VectorIndex::load(dir.path(), Trust::Unverified).unwrap_err();
    assert!(matches!(err, GradeError::IndexLoad { .. }));
}

#[test]
fn test_load_detects_tampering() {
    let dir = tempdir().unwrap();
    three_entry_index().save(dir.path()).unwrap();

    let chunks_path = dir.path().join("chunks.json");
    let text = fs::read_to_string(&chunks_path).unwrap();
    fs::write(&chunks_path, text.replace("\"a\"", "\"evil\"")).unwrap();

    let err = VectorIndex::load(dir.path(), Trust::Acknowledged).unwrap_err();
    assert!(matches!(err, GradeError::IndexLoad { .. }));
    assert!(err.to_string().contains("checksum"));
}

/// Rewrite `vectors.json` and patch the manifest digest so only the
/// structural checks can catch the problem
fn rewrite_vectors(dir: &std::path::Path, vectors: serde_json::Value) {
    let bytes = serde_json::to_vec(&vectors).unwrap();
    fs::write(dir.join("vectors.json"), &bytes).unwrap();

    let manifest_path = dir.join("manifest.json");
    let mut manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&manifest_path).unwrap()).unwrap();
    manifest["vectors_sha256"] = serde_json::Value::String(sha256_for_test(&bytes));
    fs::write(&manifest_path, serde_json::to_string(&manifest).unwrap()).unwrap();
}

fn sha256_for_test(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[test]
fn test_load_rejects_duplicate_ids() {
    let dir = tempdir().unwrap();
    three_entry_index().save(dir.path()).unwrap();
    rewrite_vectors(
        dir.path(),
        serde_json::json!({
            "dimension": 2,
            "vectors": [
                {"id": 0, "vector": [1.0, 0.0]},
                {"id": 0, "vector": [0.0, 1.0]},
                {"id": 2, "vector": [0.7, 0.7]}
            ]
        }),
    );

    let err = VectorIndex::load(dir.path(), Trust::Acknowledged).unwrap_err();
    assert!(err.to_string().contains("duplicate"), "{}", err);
}

#[test]
fn test_load_rejects_wrong_vector_dimension() {
    let dir = tempdir().unwrap();
    three_entry_index().save(dir.path()).unwrap();
    rewrite_vectors(
        dir.path(),
        serde_json::json!({
            "dimension": 2,
            "vectors": [
                {"id": 0, "vector": [1.0, 0.0]},
                {"id": 1, "vector": [0.0, 1.0, 0.5]},
                {"id": 2, "vector": [0.7, 0.7]}
            ]
        }),
    );

    let err = VectorIndex::load(dir.path(), Trust::Acknowledged).unwrap_err();
    assert!(matches!(err, GradeError::IndexLoad { .. }));
}

#[test]
fn test_load_rejects_malformed_manifest() {
    let dir = tempdir().unwrap();
    three_entry_index().save(dir.path()).unwrap();
    fs::write(dir.path().join("manifest.json"), "{not json").unwrap();

    let err = VectorIndex::load(dir.path(), Trust::Acknowledged).unwrap_err();
    assert!(matches!(err, GradeError::IndexLoad { .. }));
}

#[test]
fn test_loaded_vectors_are_renormalized() {
    let built = VectorIndex::build(
        vec![chunk(0, "a"), chunk(1, "b")],
        vec![vec![1.0, 0.0], vec![0.6, 0.8]],
    )
    .unwrap();
    let dir = tempdir().unwrap();
    built.save(dir.path()).unwrap();
    rewrite_vectors(
        dir.path(),
        serde_json::json!({
            "dimension": 2,
            "vectors": [
                {"id": 0, "vector": [1.0, 0.0]},
                {"id": 1, "vector": [6.0, 8.0]}
            ]
        }),
    );

    let loaded = VectorIndex::load(dir.path(), Trust::Acknowledged).unwrap();
    let expected = built.query(&[0.8, 0.6], 2).unwrap();
    let hits = loaded.query(&[0.8, 0.6], 2).unwrap();

    assert_eq!(hits.len(), expected.len());
    for (hit, want) in hits.iter().zip(&expected) {
        assert_eq!(hit.id, want.id);
        assert!((hit.similarity - want.similarity).abs() < 1e-6);
        assert!(hit.similarity <= 1.0 + 1e-6);
    }
    assert_eq!(hits[0].id, 1);
}
