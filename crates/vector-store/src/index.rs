use crate::error::{Result, VectorStoreError};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

const INDEX_MAGIC: &[u8; 4] = b"DQVI";
const INDEX_FORMAT_VERSION: u8 = 1;
// magic(4) + version(1) + kind(1) + reserved(2) + dimension(4) + count(8)
const HEADER_LEN: usize = 20;

/// Supported vector index variants, resolved once from configuration.
///
/// Serialized as `flat_l2`/`flat_ip`; config values accept every name that
/// [`FromStr`] does, including `IndexFlatL2` and `IndexFlatIP`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum IndexKind {
    /// Exhaustive search by squared Euclidean distance.
    #[default]
    FlatL2,
    /// Exhaustive search by inner product, reported as `-dot(q, v)`.
    FlatIp,
}

impl IndexKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FlatL2 => "flat_l2",
            Self::FlatIp => "flat_ip",
        }
    }

    const fn tag(self) -> u8 {
        match self {
            Self::FlatL2 => 1,
            Self::FlatIp => 2,
        }
    }

    const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::FlatL2),
            2 => Some(Self::FlatIp),
            _ => None,
        }
    }

    /// Creates an empty index of this kind.
    #[must_use]
    pub fn build(self, dimension: usize) -> Box<dyn VectorIndex> {
        Box::new(FlatIndex::new(self, dimension))
    }
}

impl FromStr for IndexKind {
    type Err = VectorStoreError;

    fn from_str(raw: &str) -> Result<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|ch| *ch != '_' && *ch != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "flatl2" | "indexflatl2" | "l2" => Ok(Self::FlatL2),
            "flatip" | "indexflatip" | "ip" => Ok(Self::FlatIp),
            _ => Err(VectorStoreError::UnsupportedIndexKind(raw.to_string())),
        }
    }
}

impl TryFrom<String> for IndexKind {
    type Error = VectorStoreError;

    fn try_from(raw: String) -> Result<Self> {
        raw.parse()
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One search candidate. Handles are signed so that backends which report
/// "no result" as `-1` can be represented; callers must range-check them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub handle: i64,
    pub distance: f32,
}

/// Append-only vector index addressed by insertion-order handles.
pub trait VectorIndex: Send + Sync {
    fn kind(&self) -> IndexKind;

    fn dimension(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a vector and returns its handle (the previous length).
    fn add(&mut self, vector: &[f32]) -> Result<usize>;

    /// Drops every vector whose handle is `>= len`. Used to undo an append
    /// whose commit failed; handles below `len` are untouched.
    fn truncate(&mut self, len: usize);

    /// Returns up to `limit` nearest vectors, closest first.
    fn search(&self, query: &[f32], limit: usize) -> Result<Vec<Neighbor>>;

    /// Serializes the full index for persistence.
    fn to_bytes(&self) -> Vec<u8>;
}

/// Brute-force index over a contiguous row-major buffer.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    kind: IndexKind,
    dimension: usize,
    vectors: Vec<f32>,
}

impl FlatIndex {
    #[must_use]
    pub const fn new(kind: IndexKind, dimension: usize) -> Self {
        Self {
            kind,
            dimension,
            vectors: Vec::new(),
        }
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.vectors.chunks_exact(self.dimension.max(1))
    }

    fn distance(&self, query: ArrayView1<'_, f32>, row: &[f32]) -> f32 {
        let row = ArrayView1::from(row);
        match self.kind {
            IndexKind::FlatL2 => {
                let diff = &query - &row;
                diff.dot(&diff)
            }
            IndexKind::FlatIp => -query.dot(&row),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN || &bytes[0..4] != INDEX_MAGIC {
            return Err(VectorStoreError::CorruptIndex(
                "missing index header".to_string(),
            ));
        }
        if bytes[4] != INDEX_FORMAT_VERSION {
            return Err(VectorStoreError::CorruptIndex(format!(
                "unsupported index format version {} (expected {INDEX_FORMAT_VERSION})",
                bytes[4]
            )));
        }
        let kind = IndexKind::from_tag(bytes[5]).ok_or_else(|| {
            VectorStoreError::CorruptIndex(format!("unknown index kind tag {}", bytes[5]))
        })?;
        let dimension = read_u32(&bytes[8..12])? as usize;
        let count = usize::try_from(read_u64(&bytes[12..20])?)
            .map_err(|_| VectorStoreError::CorruptIndex("vector count overflow".to_string()))?;
        if dimension == 0 {
            return Err(VectorStoreError::CorruptIndex(
                "index dimension is zero".to_string(),
            ));
        }

        let expected_len = count
            .checked_mul(dimension)
            .and_then(|floats| floats.checked_mul(4))
            .and_then(|body| body.checked_add(HEADER_LEN))
            .ok_or_else(|| VectorStoreError::CorruptIndex("index size overflow".to_string()))?;
        if bytes.len() != expected_len {
            return Err(VectorStoreError::CorruptIndex(format!(
                "index body is {} bytes, expected {expected_len}",
                bytes.len()
            )));
        }

        let vectors = bytes[HEADER_LEN..]
            .chunks_exact(4)
            .map(|raw| f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
            .collect();

        Ok(Self {
            kind,
            dimension,
            vectors,
        })
    }
}

impl VectorIndex for FlatIndex {
    fn kind(&self) -> IndexKind {
        self.kind
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        if self.dimension == 0 {
            return 0;
        }
        self.vectors.len() / self.dimension
    }

    fn add(&mut self, vector: &[f32]) -> Result<usize> {
        self.check_dimension(vector)?;
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(VectorStoreError::IndexError(
                "vector contains non-finite values".to_string(),
            ));
        }
        let handle = self.len();
        self.vectors.extend_from_slice(vector);
        Ok(handle)
    }

    fn truncate(&mut self, len: usize) {
        self.vectors.truncate(len.saturating_mul(self.dimension));
    }

    fn search(&self, query: &[f32], limit: usize) -> Result<Vec<Neighbor>> {
        self.check_dimension(query)?;
        if limit == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let query_view = ArrayView1::from(query);
        let mut scored: Vec<Neighbor> = self
            .rows()
            .enumerate()
            .map(|(handle, row)| Neighbor {
                handle: handle as i64,
                distance: self.distance(query_view, row),
            })
            .collect();

        scored.sort_by(|a, b| match a.distance.total_cmp(&b.distance) {
            Ordering::Equal => a.handle.cmp(&b.handle),
            other => other,
        });
        scored.truncate(limit);
        Ok(scored)
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.vectors.len() * 4);
        out.extend_from_slice(INDEX_MAGIC);
        out.push(INDEX_FORMAT_VERSION);
        out.push(self.kind.tag());
        out.extend_from_slice(&[0, 0]);
        #[allow(clippy::cast_possible_truncation)]
        let dim = self.dimension as u32;
        out.extend_from_slice(&dim.to_le_bytes());
        out.extend_from_slice(&(self.len() as u64).to_le_bytes());
        for value in &self.vectors {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }
}

/// Decodes an index previously produced by [`VectorIndex::to_bytes`].
pub fn decode_index(bytes: &[u8]) -> Result<Box<dyn VectorIndex>> {
    Ok(Box::new(FlatIndex::from_bytes(bytes)?))
}

fn read_u32(raw: &[u8]) -> Result<u32> {
    let arr: [u8; 4] = raw
        .try_into()
        .map_err(|_| VectorStoreError::CorruptIndex("truncated header".to_string()))?;
    Ok(u32::from_le_bytes(arr))
}

fn read_u64(raw: &[u8]) -> Result<u64> {
    let arr: [u8; 8] = raw
        .try_into()
        .map_err(|_| VectorStoreError::CorruptIndex("truncated header".to_string()))?;
    Ok(u64::from_le_bytes(arr))
}
