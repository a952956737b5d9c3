//! On-disk index format and the validating loader
//!
//! An index directory holds three JSON files:
//! - `vectors.json`: dimension and the ordered `(id, vector)` list
//! - `chunks.json`: the `id -> chunk` mapping
//! - `manifest.json`: format version, counts, metric, provider and SHA-256
//!   digests of the two data files
//!
//! Loading is a trust boundary. The caller must acknowledge the source with
//! [`Trust::Acknowledged`], and the data is checked structurally (digests,
//! dimension consistency, unique contiguous ids, matching id sets, finite
//! values) before an index is handed out. Stored vectors are normalized again
//! on load, so an index written elsewhere still scores by cosine.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{normalized, IndexEntry, VectorIndex, METRIC};
use crate::bail_index_load;
use crate::chunk::Chunk;
use crate::embedding::Embedding;
use crate::error::{GradeError, Result};

/// Current on-disk format version
pub const INDEX_FORMAT_VERSION: u32 = 1;

const MANIFEST_FILE: &str = "manifest.json";
const VECTORS_FILE: &str = "vectors.json";
const CHUNKS_FILE: &str = "chunks.json";

/// Whether the caller vouches for where a persisted index came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trust {
    /// Origin unknown; loading is refused
    Unverified,
    /// The caller produced or otherwise trusts this index
    Acknowledged,
}

/// Summary written next to the index data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub version: u32,
    /// Unique id of the build that wrote this index
    pub build_id: String,
    pub created_at: DateTime<Utc>,
    pub metric: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub dimension: usize,
    pub count: usize,
    pub vectors_sha256: String,
    pub chunks_sha256: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct VectorsFile {
    dimension: usize,
    vectors: Vec<StoredVector>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredVector {
    id: usize,
    vector: Embedding,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChunksFile {
    chunks: Vec<StoredChunk>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredChunk {
    id: usize,
    chunk: Chunk,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

impl VectorIndex {
    /// Write the index to `dir`, creating it if needed. The manifest is
    /// written last so a crash mid-save leaves no loadable index behind.
    #[tracing::instrument(skip_all, fields(dir = %dir.display(), entries = self.len()))]
    pub fn save(&self, dir: &Path) -> Result<IndexManifest> {
        fs::create_dir_all(dir)?;

        let vectors = VectorsFile {
            dimension: self.dimension,
            vectors: self
                .entries
                .iter()
                .map(|e| StoredVector {
                    id: e.id,
                    vector: e.vector.clone(),
                })
                .collect(),
        };
        let chunks = ChunksFile {
            chunks: self
                .entries
                .iter()
                .map(|e| StoredChunk {
                    id: e.id,
                    chunk: e.chunk.clone(),
                })
                .collect(),
        };

        let vectors_bytes = serde_json::to_vec(&vectors)?;
        let chunks_bytes = serde_json::to_vec_pretty(&chunks)?;

        let manifest = IndexManifest {
            version: INDEX_FORMAT_VERSION,
            build_id: ulid::Ulid::new().to_string(),
            created_at: Utc::now(),
            metric: METRIC.to_string(),
            provider: self.provider.clone(),
            dimension: self.dimension,
            count: self.entries.len(),
            vectors_sha256: sha256_hex(&vectors_bytes),
            chunks_sha256: sha256_hex(&chunks_bytes),
        };

        fs::write(dir.join(VECTORS_FILE), &vectors_bytes)?;
        fs::write(dir.join(CHUNKS_FILE), &chunks_bytes)?;
        fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_string_pretty(&manifest)?,
        )?;

        tracing::info!(build_id = %manifest.build_id, "saved vector index");
        Ok(manifest)
    }

    /// Read only the manifest of a persisted index
    pub fn read_manifest(dir: &Path) -> Result<IndexManifest> {
        let bytes = read_file(dir, MANIFEST_FILE)?;
        let manifest: IndexManifest = serde_json::from_slice(&bytes)
            .map_err(|e| GradeError::index_load(dir, format!("malformed manifest: {}", e)))?;
        Ok(manifest)
    }

    /// Load and validate a persisted index
    #[tracing::instrument(skip_all, fields(dir = %dir.display(), ?trust))]
    pub fn load(dir: &Path, trust: Trust) -> Result<Self> {
        if trust != Trust::Acknowledged {
            bail_index_load!(
                dir,
                "refusing to load an index whose source has not been acknowledged as trusted"
            );
        }
        if !dir.is_dir() {
            bail_index_load!(dir, "no index directory at this path");
        }

        let manifest = Self::read_manifest(dir)?;
        if manifest.version != INDEX_FORMAT_VERSION {
            bail_index_load!(
                dir,
                "unsupported format version {} (expected {})",
                manifest.version,
                INDEX_FORMAT_VERSION
            );
        }
        if manifest.metric != METRIC {
            bail_index_load!(dir, "unsupported metric '{}'", manifest.metric);
        }

        let vectors: VectorsFile = read_verified(dir, VECTORS_FILE, &manifest.vectors_sha256)?;
        let chunks: ChunksFile = read_verified(dir, CHUNKS_FILE, &manifest.chunks_sha256)?;

        let entries = assemble_entries(dir, &manifest, vectors, chunks)?;

        tracing::info!(
            entries = entries.len(),
            dimension = manifest.dimension,
            build_id = %manifest.build_id,
            "loaded vector index"
        );
        Ok(Self {
            dimension: manifest.dimension,
            entries,
            provider: manifest.provider,
        })
    }
}

fn read_file(dir: &Path, name: &str) -> Result<Vec<u8>> {
    fs::read(dir.join(name))
        .map_err(|e| GradeError::index_load(dir, format!("cannot read {}: {}", name, e)))
}

fn read_verified<T: serde::de::DeserializeOwned>(
    dir: &Path,
    name: &str,
    expected_sha256: &str,
) -> Result<T> {
    let bytes = read_file(dir, name)?;
    let actual = sha256_hex(&bytes);
    if actual != expected_sha256 {
        bail_index_load!(dir, "{} does not match the checksum in the manifest", name);
    }
    serde_json::from_slice(&bytes)
        .map_err(|e| GradeError::index_load(dir, format!("malformed {}: {}", name, e)))
}

/// Check the two data files against each other and the manifest, then pair
/// vectors with chunks in id order
fn assemble_entries(
    dir: &Path,
    manifest: &IndexManifest,
    vectors: VectorsFile,
    chunks: ChunksFile,
) -> Result<Vec<IndexEntry>> {
    if vectors.dimension != manifest.dimension {
        bail_index_load!(
            dir,
            "vectors file dimension {} differs from manifest dimension {}",
            vectors.dimension,
            manifest.dimension
        );
    }
    if vectors.vectors.len() != manifest.count || chunks.chunks.len() != manifest.count {
        bail_index_load!(
            dir,
            "expected {} entries, found {} vectors and {} chunks",
            manifest.count,
            vectors.vectors.len(),
            chunks.chunks.len()
        );
    }
    if manifest.count > 0 && manifest.dimension == 0 {
        bail_index_load!(dir, "non-empty index with zero dimension");
    }

    let mut seen = HashSet::with_capacity(manifest.count);
    for stored in &vectors.vectors {
        if !seen.insert(stored.id) {
            bail_index_load!(dir, "duplicate vector id {}", stored.id);
        }
        if stored.id >= manifest.count {
            bail_index_load!(dir, "vector id {} is out of range", stored.id);
        }
        if stored.vector.len() != manifest.dimension {
            bail_index_load!(
                dir,
                "vector {} has dimension {}, expected {}",
                stored.id,
                stored.vector.len(),
                manifest.dimension
            );
        }
        if stored.vector.iter().any(|x| !x.is_finite()) {
            bail_index_load!(dir, "vector {} contains non-finite values", stored.id);
        }
    }

    let mut slots: Vec<Option<Chunk>> = vec![None; manifest.count];
    for stored in chunks.chunks {
        match slots.get_mut(stored.id) {
            Some(slot @ None) => *slot = Some(stored.chunk),
            Some(Some(_)) => bail_index_load!(dir, "duplicate chunk id {}", stored.id),
            None => bail_index_load!(dir, "chunk id {} is out of range", stored.id),
        }
    }

    let mut stored_vectors = vectors.vectors;
    stored_vectors.sort_by_key(|v| v.id);

    stored_vectors
        .into_iter()
        .zip(slots)
        .map(|(stored, chunk)| match chunk {
            Some(chunk) => Ok(IndexEntry {
                id: stored.id,
                vector: normalized(stored.vector),
                chunk,
            }),
            None => Err(GradeError::index_load(
                dir,
                format!("vector {} has no chunk metadata", stored.id),
            )),
        })
        .collect()
}
