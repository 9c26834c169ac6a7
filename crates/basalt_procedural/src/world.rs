//! # World Streaming Manager
//!
//! Keeps a square window of chunks resident around a moving observer.
//! Chunks inside the draw-distance window (Chebyshev metric) are queued
//! for generation; chunks that fall outside are dropped immediately, and
//! queued work for them is cancelled.
//!
//! Generation is deferred: [`World::update`] only reconciles the window
//! and the queue, while [`World::process_pending`] does bounded amounts of
//! actual generation, so callers control how much work happens per frame.
//!
//! Block mutations route to the owning resident chunk and are mirrored
//! into the edit overlay, which is what [`World::save`] persists. Chunk
//! contents themselves are never saved; they are replayed from
//! `(seed, params, edits)`.

use std::collections::{HashMap, HashSet, VecDeque};

use basalt_registry::BlockKind;
use tracing::{debug, info};

use crate::chunk::{Chunk, ChunkCoord, LocalPos};
use crate::edits::EditStore;
use crate::error::WorldResult;
use crate::params::GenerationParams;

/// Default draw distance in chunks.
pub const DEFAULT_DRAW_DISTANCE: u32 = 2;

/// Lifecycle state of one chunk coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// Outside the window, or never requested.
    Absent,
    /// Queued for generation but not yet built.
    Loading,
    /// Fully generated and queryable.
    Resident,
}

/// Counters describing the current streaming state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    /// Fully generated chunks currently held.
    pub resident_chunks: usize,
    /// Chunks queued for generation.
    pub pending_chunks: usize,
    /// Visible-instance slots across all resident chunks.
    pub total_instances: usize,
    /// Block overrides recorded in the edit overlay.
    pub edited_blocks: usize,
}

/// Serialized world state: generation parameters plus the edit overlay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldSave {
    /// JSON-encoded [`GenerationParams`].
    pub params: Vec<u8>,
    /// Compressed edit-overlay blob.
    pub edits: Vec<u8>,
}

/// Streaming chunk manager around a single observer.
pub struct World {
    params: GenerationParams,
    draw_distance: u32,
    chunks: HashMap<ChunkCoord, Chunk>,
    pending: VecDeque<ChunkCoord>,
    pending_set: HashSet<ChunkCoord>,
    edits: EditStore,
    observer: ChunkCoord,
}

impl World {
    /// Creates a world with the default draw distance. No chunks are
    /// resident until [`World::update`] runs.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WorldError::InvalidParams`] if the parameters are
    /// out of range.
    pub fn new(params: GenerationParams) -> WorldResult<Self> {
        Self::with_draw_distance(params, DEFAULT_DRAW_DISTANCE)
    }

    /// Creates a world with an explicit draw distance.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WorldError::InvalidParams`] if the parameters are
    /// out of range.
    pub fn with_draw_distance(params: GenerationParams, draw_distance: u32) -> WorldResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            draw_distance,
            chunks: HashMap::new(),
            pending: VecDeque::new(),
            pending_set: HashSet::new(),
            edits: EditStore::new(),
            observer: ChunkCoord::new(0, 0),
        })
    }

    /// The active generation parameters.
    #[must_use]
    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// The current draw distance in chunks.
    #[must_use]
    pub fn draw_distance(&self) -> u32 {
        self.draw_distance
    }

    /// Changes the draw distance. Takes effect on the next
    /// [`World::update`].
    pub fn set_draw_distance(&mut self, draw_distance: u32) {
        self.draw_distance = draw_distance;
    }

    /// Reconciles the resident window against an observer at the given
    /// world-space position.
    ///
    /// Chunks newly inside the window are queued; chunks outside it are
    /// dropped and their queued work cancelled. Does no generation itself.
    pub fn update(&mut self, observer_x: i32, observer_z: i32) {
        let center = ChunkCoord::from_world(observer_x, observer_z, self.params.dims.width);
        self.observer = center;
        let d = self.draw_distance;

        let before = self.chunks.len();
        self.chunks
            .retain(|coord, _| coord.chebyshev_distance(center) <= d);
        let unloaded = before - self.chunks.len();

        let cancelled_before = self.pending_set.len();
        self.pending_set
            .retain(|coord| coord.chebyshev_distance(center) <= d);
        let cancelled = cancelled_before - self.pending_set.len();

        let di = d as i32;
        let mut queued = 0;
        for dz in -di..=di {
            for dx in -di..=di {
                let coord = ChunkCoord::new(center.x + dx, center.z + dz);
                if !self.chunks.contains_key(&coord) && self.pending_set.insert(coord) {
                    self.pending.push_back(coord);
                    queued += 1;
                }
            }
        }

        if unloaded > 0 || cancelled > 0 || queued > 0 {
            debug!(
                center_x = center.x,
                center_z = center.z,
                queued,
                unloaded,
                cancelled,
                "reconciled chunk window"
            );
        }
    }

    /// Generates up to `budget` queued chunks, oldest first. Cancelled
    /// entries are skipped without consuming budget. Returns how many
    /// chunks were generated.
    pub fn process_pending(&mut self, budget: usize) -> usize {
        let mut generated = 0;
        while generated < budget {
            let Some(coord) = self.pending.pop_front() else {
                break;
            };
            // Entries evicted from the set were cancelled by a later update.
            if !self.pending_set.remove(&coord) {
                continue;
            }
            let chunk = Chunk::generate(coord, &self.params, &self.edits);
            self.chunks.insert(coord, chunk);
            generated += 1;
        }
        generated
    }

    /// Generates every queued chunk.
    pub fn flush_generation_queue(&mut self) {
        while self.process_pending(usize::MAX) > 0 {}
    }

    /// Queues and generates the full window around a world-space position
    /// in one call.
    pub fn ensure_loaded_around(&mut self, observer_x: i32, observer_z: i32) {
        self.update(observer_x, observer_z);
        self.flush_generation_queue();
    }

    /// Lifecycle state of a chunk coordinate.
    #[must_use]
    pub fn chunk_state(&self, coord: ChunkCoord) -> ChunkState {
        if self.chunks.contains_key(&coord) {
            ChunkState::Resident
        } else if self.pending_set.contains(&coord) {
            ChunkState::Loading
        } else {
            ChunkState::Absent
        }
    }

    /// A resident chunk, if generated.
    #[must_use]
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Number of resident chunks.
    #[must_use]
    pub fn loaded_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Number of chunks queued for generation.
    #[must_use]
    pub fn pending_chunk_count(&self) -> usize {
        self.pending_set.len()
    }

    /// The block kind at a world-space position, or `None` if the position
    /// is outside the vertical extent or the owning chunk is not resident.
    #[must_use]
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Option<BlockKind> {
        let (coord, pos) = self.split_world(x, y, z)?;
        self.chunks.get(&coord)?.kind(pos)
    }

    /// Places a block at a world-space position.
    ///
    /// The mutation routes to the owning resident chunk and is recorded in
    /// the edit overlay. Returns false without effect if the target chunk
    /// is not resident, the position is out of vertical bounds, or the
    /// cell is occupied.
    pub fn add_block(&mut self, x: i32, y: i32, z: i32, kind: BlockKind) -> bool {
        let Some((coord, pos)) = self.split_world(x, y, z) else {
            return false;
        };
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return false;
        };
        if chunk.add_block(pos, kind) {
            self.edits.set(coord, pos, kind);
            debug!(x, y, z, ?kind, "placed block");
            true
        } else {
            false
        }
    }

    /// Removes the block at a world-space position.
    ///
    /// Records an empty-cell override so the removal survives regeneration.
    /// Returns false without effect if the target chunk is not resident or
    /// the cell is already empty.
    pub fn remove_block(&mut self, x: i32, y: i32, z: i32) -> bool {
        let Some((coord, pos)) = self.split_world(x, y, z) else {
            return false;
        };
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return false;
        };
        if let Some(kind) = chunk.remove_block(pos) {
            self.edits.set(coord, pos, BlockKind::Empty);
            debug!(x, y, z, ?kind, "removed block");
            true
        } else {
            false
        }
    }

    /// The edit overlay.
    #[must_use]
    pub fn edits(&self) -> &EditStore {
        &self.edits
    }

    /// Serializes parameters and the edit overlay.
    ///
    /// # Errors
    ///
    /// Returns a blob-encoding error from either component.
    pub fn save(&self) -> WorldResult<WorldSave> {
        let save = WorldSave {
            params: self.params.to_json()?,
            edits: self.edits.to_blob(self.params.dims)?,
        };
        info!(
            edited_blocks = self.edits.len(),
            bytes = save.params.len() + save.edits.len(),
            "saved world"
        );
        Ok(save)
    }

    /// Restores a world from a save. No chunks are resident afterwards;
    /// they regenerate on demand with the saved edits replayed.
    ///
    /// # Errors
    ///
    /// Returns a decode error if either blob is malformed, or
    /// [`crate::WorldError::InvalidParams`] if the saved parameters are
    /// out of range.
    pub fn load(save: &WorldSave) -> WorldResult<Self> {
        let params = GenerationParams::from_json(&save.params)?;
        let edits = EditStore::from_blob(&save.edits, params.dims)?;
        let mut world = Self::new(params)?;
        world.edits = edits;
        info!(edited_blocks = world.edits.len(), "loaded world");
        Ok(world)
    }

    /// Replaces the generation parameters, invalidating every resident and
    /// queued chunk. The edit overlay is kept.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WorldError::InvalidParams`] and leaves the world
    /// untouched if the new parameters are out of range.
    pub fn set_params(&mut self, params: GenerationParams) -> WorldResult<()> {
        params.validate()?;
        self.params = params;
        self.chunks.clear();
        self.pending.clear();
        self.pending_set.clear();
        info!("replaced generation parameters, all chunks invalidated");
        Ok(())
    }

    /// Regenerates every resident chunk in place with the current
    /// parameters. With `clear_edits` the overlay is emptied first, so the
    /// world reverts to pristine generated terrain.
    pub fn regenerate(&mut self, clear_edits: bool) {
        if clear_edits {
            self.edits.clear();
        }
        let coords: Vec<ChunkCoord> = self.chunks.keys().copied().collect();
        for coord in &coords {
            let chunk = Chunk::generate(*coord, &self.params, &self.edits);
            self.chunks.insert(*coord, chunk);
        }
        info!(chunks = coords.len(), clear_edits, "regenerated resident chunks");
    }

    /// Current streaming counters.
    #[must_use]
    pub fn stats(&self) -> WorldStats {
        WorldStats {
            resident_chunks: self.chunks.len(),
            pending_chunks: self.pending_set.len(),
            total_instances: self.chunks.values().map(Chunk::instance_count).sum(),
            edited_blocks: self.edits.len(),
        }
    }

    /// Splits a world-space position into chunk coordinate and local
    /// position. `None` if `y` is outside the vertical extent.
    fn split_world(&self, x: i32, y: i32, z: i32) -> Option<(ChunkCoord, LocalPos)> {
        if y < 0 || y as usize >= self.params.dims.height {
            return None;
        }
        let w = self.params.dims.width as i32;
        let coord = ChunkCoord::from_world(x, z, self.params.dims.width);
        let pos = LocalPos::new(
            x.rem_euclid(w) as usize,
            y as usize,
            z.rem_euclid(w) as usize,
        );
        Some((coord, pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        let mut params = GenerationParams::default();
        params.seed = 7;
        World::new(params).unwrap()
    }

    fn flat_world() -> (World, usize) {
        let mut params = GenerationParams::default();
        params.seed = 7;
        params.terrain.magnitude = 0.0;
        params.terrain.offset = 0.5;
        params.terrain.water_height = 0;
        params.trees.frequency = 0.0;
        params.clouds.density = 0.0;
        let surface = (params.dims.height as f64 * 0.5).floor() as usize;
        (World::new(params).unwrap(), surface)
    }

    #[test]
    fn window_fills_after_flush() {
        let mut w = world();
        w.ensure_loaded_around(0, 0);
        let side = 2 * DEFAULT_DRAW_DISTANCE as usize + 1;
        assert_eq!(w.loaded_chunk_count(), side * side);
        assert_eq!(w.stats().pending_chunks, 0);
        assert_eq!(
            w.chunk_state(ChunkCoord::new(2, 2)),
            ChunkState::Resident
        );
        assert_eq!(w.chunk_state(ChunkCoord::new(3, 0)), ChunkState::Absent);
    }

    #[test]
    fn update_queues_without_generating() {
        let mut w = world();
        w.update(0, 0);
        assert_eq!(w.loaded_chunk_count(), 0);
        let side = 2 * DEFAULT_DRAW_DISTANCE as usize + 1;
        assert_eq!(w.stats().pending_chunks, side * side);
        assert_eq!(w.chunk_state(ChunkCoord::new(0, 0)), ChunkState::Loading);
    }

    #[test]
    fn budget_bounds_generation() {
        let mut w = world();
        w.update(0, 0);
        assert_eq!(w.process_pending(3), 3);
        assert_eq!(w.loaded_chunk_count(), 3);
        w.flush_generation_queue();
        let side = 2 * DEFAULT_DRAW_DISTANCE as usize + 1;
        assert_eq!(w.loaded_chunk_count(), side * side);
    }

    #[test]
    fn movement_slides_the_window() {
        let mut w = world();
        w.ensure_loaded_around(0, 0);
        // Move far enough that the windows do not overlap.
        let width = w.params().dims.width as i32;
        w.ensure_loaded_around(100 * width, 0);

        let side = 2 * DEFAULT_DRAW_DISTANCE as usize + 1;
        assert_eq!(w.loaded_chunk_count(), side * side);
        assert_eq!(w.chunk_state(ChunkCoord::new(0, 0)), ChunkState::Absent);
        assert_eq!(
            w.chunk_state(ChunkCoord::new(100, 0)),
            ChunkState::Resident
        );
    }

    #[test]
    fn moving_away_cancels_queued_work() {
        let mut w = world();
        w.update(0, 0);
        let width = w.params().dims.width as i32;
        w.update(100 * width, 0);
        w.flush_generation_queue();

        // Nothing from the abandoned window was ever generated.
        assert_eq!(w.chunk_state(ChunkCoord::new(0, 0)), ChunkState::Absent);
        let side = 2 * DEFAULT_DRAW_DISTANCE as usize + 1;
        assert_eq!(w.loaded_chunk_count(), side * side);
    }

    #[test]
    fn negative_world_coordinates_resolve() {
        let (mut w, surface) = flat_world();
        w.ensure_loaded_around(-40, -40);
        assert_eq!(
            w.get_block(-1, surface as i32, -1),
            Some(BlockKind::Grass)
        );
        assert_eq!(w.get_block(-1, surface as i32 + 1, -1), Some(BlockKind::Empty));
    }

    #[test]
    fn get_block_out_of_bounds() {
        let (mut w, _) = flat_world();
        w.ensure_loaded_around(0, 0);
        assert_eq!(w.get_block(0, -1, 0), None);
        assert_eq!(w.get_block(0, 1000, 0), None);
        // Outside the resident window.
        assert_eq!(w.get_block(10_000, 5, 0), None);
    }

    #[test]
    fn mutations_route_and_record_edits() {
        let (mut w, surface) = flat_world();
        w.ensure_loaded_around(0, 0);
        let y = surface as i32;

        assert!(w.remove_block(5, y, 5));
        assert_eq!(w.get_block(5, y, 5), Some(BlockKind::Empty));
        assert!(w.add_block(5, y, 5, BlockKind::Stone));
        assert_eq!(w.get_block(5, y, 5), Some(BlockKind::Stone));
        assert_eq!(w.stats().edited_blocks, 1);

        // No-ops leave the overlay untouched.
        assert!(!w.add_block(5, y, 5, BlockKind::Dirt));
        assert!(!w.remove_block(5, y + 5, 5));
        assert_eq!(w.stats().edited_blocks, 1);
    }

    #[test]
    fn mutation_outside_resident_window_is_dropped() {
        let (mut w, surface) = flat_world();
        w.ensure_loaded_around(0, 0);
        assert!(!w.remove_block(10_000, surface as i32, 0));
        assert_eq!(w.stats().edited_blocks, 0);
    }

    #[test]
    fn edits_survive_unload_and_reload() {
        let (mut w, surface) = flat_world();
        w.ensure_loaded_around(0, 0);
        let y = surface as i32;
        assert!(w.remove_block(3, y, 3));

        // Walk away so chunk (0, 0) unloads, then come back.
        let width = w.params().dims.width as i32;
        w.ensure_loaded_around(100 * width, 0);
        assert_eq!(w.chunk_state(ChunkCoord::new(0, 0)), ChunkState::Absent);
        w.ensure_loaded_around(0, 0);

        assert_eq!(w.get_block(3, y, 3), Some(BlockKind::Empty));
    }

    #[test]
    fn save_load_round_trip() {
        let (mut w, surface) = flat_world();
        w.ensure_loaded_around(0, 0);
        let y = surface as i32;
        assert!(w.remove_block(1, y, 2));
        assert!(w.add_block(1, y + 1, 2, BlockKind::Trunk));

        let save = w.save().unwrap();
        let mut restored = World::load(&save).unwrap();
        assert_eq!(restored.params(), w.params());
        assert_eq!(restored.loaded_chunk_count(), 0);

        restored.ensure_loaded_around(0, 0);
        assert_eq!(restored.get_block(1, y, 2), Some(BlockKind::Empty));
        assert_eq!(restored.get_block(1, y + 1, 2), Some(BlockKind::Trunk));
    }

    #[test]
    fn set_params_invalidates_chunks_but_keeps_edits() {
        let (mut w, surface) = flat_world();
        w.ensure_loaded_around(0, 0);
        assert!(w.remove_block(2, surface as i32, 2));

        let mut params = w.params().clone();
        params.seed = 999;
        w.set_params(params).unwrap();
        assert_eq!(w.loaded_chunk_count(), 0);
        assert_eq!(w.stats().edited_blocks, 1);

        let mut bad = w.params().clone();
        bad.terrain.scale = 0.0;
        assert!(w.set_params(bad).is_err());
    }

    #[test]
    fn regenerate_is_stable() {
        let (mut w, surface) = flat_world();
        w.ensure_loaded_around(0, 0);
        let y = surface as i32;
        assert!(w.remove_block(4, y, 4));
        let before = w.stats();

        w.regenerate(false);
        assert_eq!(w.stats(), before);
        assert_eq!(w.get_block(4, y, 4), Some(BlockKind::Empty));
    }

    #[test]
    fn regenerate_can_revert_edits() {
        let (mut w, surface) = flat_world();
        w.ensure_loaded_around(0, 0);
        let y = surface as i32;
        assert!(w.remove_block(4, y, 4));

        w.regenerate(true);
        assert_eq!(w.stats().edited_blocks, 0);
        assert_eq!(w.get_block(4, y, 4), Some(BlockKind::Grass));
    }
}
