//! # Edit Overlay
//!
//! Player modifications recorded as sparse per-chunk overrides, layered on
//! top of procedural generation. The overlay is the only state that needs
//! persisting: everything else is reproducible from `(seed, params)`.
//!
//! An override stores the final block kind for a cell, including
//! [`BlockKind::Empty`] for removals. Re-generating a chunk replays its
//! overrides as the last pipeline stage, so edits survive unload/reload and
//! draw-distance changes.

use std::collections::HashMap;

use basalt_registry::BlockKind;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chunk::{ChunkCoord, LocalPos};
use crate::error::{WorldError, WorldResult};
use crate::params::ChunkDims;

/// One persisted override: a packed local position plus the block id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct EditRecord {
    /// Local position packed as `x + y*width + z*width*height`.
    key: u32,
    /// Block kind id, [`BlockKind::Empty`] for removals.
    kind: u8,
}

/// Persisted overrides for a single chunk.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct ChunkEdits {
    chunk_x: i32,
    chunk_z: i32,
    records: Vec<EditRecord>,
}

/// Sparse store of all recorded block overrides, keyed by chunk.
///
/// Storage is dimension-independent; chunk extents only matter when
/// packing records into a save blob.
#[derive(Clone, Debug, Default)]
pub struct EditStore {
    overrides: HashMap<ChunkCoord, HashMap<LocalPos, BlockKind>>,
}

impl EditStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an override. Later writes to the same cell win.
    pub fn set(&mut self, coord: ChunkCoord, pos: LocalPos, kind: BlockKind) {
        self.overrides.entry(coord).or_default().insert(pos, kind);
    }

    /// Looks up the override for a cell, if one was recorded.
    #[must_use]
    pub fn get(&self, coord: ChunkCoord, pos: LocalPos) -> Option<BlockKind> {
        self.overrides.get(&coord)?.get(&pos).copied()
    }

    /// Returns true if an override was recorded for the cell.
    #[must_use]
    pub fn contains(&self, coord: ChunkCoord, pos: LocalPos) -> bool {
        self.get(coord, pos).is_some()
    }

    /// Like [`EditStore::get`] but failing with [`WorldError::NotFound`]
    /// when no override exists.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NotFound`] for cells with no recorded edit.
    pub fn require(&self, coord: ChunkCoord, pos: LocalPos) -> WorldResult<BlockKind> {
        self.get(coord, pos).ok_or(WorldError::NotFound {
            chunk_x: coord.x,
            chunk_z: coord.z,
            x: pos.x,
            y: pos.y,
            z: pos.z,
        })
    }

    /// All overrides recorded for one chunk, if any.
    #[must_use]
    pub fn chunk_overrides(&self, coord: ChunkCoord) -> Option<&HashMap<LocalPos, BlockKind>> {
        self.overrides.get(&coord)
    }

    /// Number of chunks with at least one override.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.overrides.len()
    }

    /// Total number of recorded overrides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.overrides.values().map(HashMap::len).sum()
    }

    /// Returns true if no overrides are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Drops every recorded override.
    pub fn clear(&mut self) {
        self.overrides.clear();
    }

    /// Serializes the whole store into a compressed blob.
    ///
    /// Chunks and records are sorted, so the same overrides always produce
    /// the same bytes regardless of insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::MalformedEditBlob`] if encoding fails.
    pub fn to_blob(&self, dims: ChunkDims) -> WorldResult<Vec<u8>> {
        let mut chunks: Vec<ChunkEdits> = self
            .overrides
            .iter()
            .map(|(coord, cells)| {
                let mut records: Vec<EditRecord> = cells
                    .iter()
                    .map(|(pos, kind)| EditRecord {
                        key: pos.pack(dims),
                        kind: kind.id(),
                    })
                    .collect();
                records.sort_unstable_by_key(|r| r.key);
                ChunkEdits {
                    chunk_x: coord.x,
                    chunk_z: coord.z,
                    records,
                }
            })
            .collect();
        chunks.sort_unstable_by_key(|c| (c.chunk_x, c.chunk_z));

        let raw =
            bincode::serialize(&chunks).map_err(|e| WorldError::MalformedEditBlob(e.to_string()))?;
        debug!(
            chunks = chunks.len(),
            records = self.len(),
            raw_bytes = raw.len(),
            "serialized edit overlay"
        );
        Ok(lz4_flex::compress_prepend_size(&raw))
    }

    /// Restores a store from a blob produced by [`EditStore::to_blob`].
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::MalformedEditBlob`] on decompression or decode
    /// failure, on an unknown block id, or on a packed key outside the
    /// given chunk extents.
    pub fn from_blob(blob: &[u8], dims: ChunkDims) -> WorldResult<Self> {
        let raw = lz4_flex::decompress_size_prepended(blob)
            .map_err(|e| WorldError::MalformedEditBlob(e.to_string()))?;
        let chunks: Vec<ChunkEdits> =
            bincode::deserialize(&raw).map_err(|e| WorldError::MalformedEditBlob(e.to_string()))?;

        let mut store = Self::new();
        for chunk in chunks {
            let coord = ChunkCoord::new(chunk.chunk_x, chunk.chunk_z);
            for record in chunk.records {
                let pos = LocalPos::unpack(record.key, dims).ok_or_else(|| {
                    WorldError::MalformedEditBlob(format!(
                        "key {} outside {}x{} chunk",
                        record.key, dims.width, dims.height
                    ))
                })?;
                let kind = BlockKind::from_id(record.kind).ok_or_else(|| {
                    WorldError::MalformedEditBlob(format!("unknown block id {}", record.kind))
                })?;
                store.set(coord, pos, kind);
            }
        }
        Ok(store)
    }
}
