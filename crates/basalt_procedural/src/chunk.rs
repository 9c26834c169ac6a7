//! # Chunk Data Model and Generation Pipeline
//!
//! A chunk is a dense block arena covering a `width x height x width`
//! region of the world, plus bookkeeping for which blocks are visible.
//!
//! ## Pipeline
//!
//! Generation runs in fixed stages over a single seeded stream:
//! resources, terrain, trees, clouds, edit replay, then the visibility
//! pass. Every noise-driven stage owns a [`NoiseField`], and all fields
//! are built from the stream up front, before any stage draws per-tree
//! randomness. The fields therefore depend only on the seed, never on
//! chunk contents, and since each stage samples at absolute world
//! coordinates the terrain, resource, and cloud patterns stay continuous
//! across chunk borders.
//!
//! ## Visible instances
//!
//! Every visible block owns exactly one slot in its kind's compact
//! instance list. A block is visible when it is non-empty and at least
//! one of its six face neighbors inside the chunk is empty (out-of-chunk
//! neighbors count as empty). Removing a slot swap-removes from the list
//! tail, so a consumer must treat slot indices as reassignable; the lists
//! themselves never have holes.

use basalt_registry::BlockKind;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::edits::EditStore;
use crate::noise::NoiseField;
use crate::params::{ChunkDims, GenerationParams};
use crate::rng::SeededRng;

/// Face-neighbor offsets, one per cardinal direction.
const NEIGHBOR_OFFSETS: [(isize, isize, isize); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

/// Horizontal chunk coordinate on the infinite chunk grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    /// Chunk grid X.
    pub x: i32,
    /// Chunk grid Z.
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a chunk coordinate.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The chunk containing a world-space column.
    ///
    /// Floor division, so negative world coordinates map correctly:
    /// world x `-1` with width 16 lands in chunk `-1`, not chunk `0`.
    #[must_use]
    pub fn from_world(world_x: i32, world_z: i32, width: usize) -> Self {
        let w = width as i32;
        Self {
            x: world_x.div_euclid(w),
            z: world_z.div_euclid(w),
        }
    }

    /// World-space coordinates of this chunk's minimum corner.
    #[must_use]
    pub fn origin(self, width: usize) -> (i32, i32) {
        let w = width as i32;
        (self.x * w, self.z * w)
    }

    /// Chebyshev distance to another chunk coordinate.
    #[must_use]
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dz = self.z.abs_diff(other.z);
        dx.max(dz)
    }
}

/// Block position local to one chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalPos {
    /// Local X, `0..width`.
    pub x: usize,
    /// Local Y, `0..height`.
    pub y: usize,
    /// Local Z, `0..width`.
    pub z: usize,
}

impl LocalPos {
    /// Creates a local position.
    #[must_use]
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Packs into the persistence key `x + y*width + z*width*height`.
    #[must_use]
    pub fn pack(self, dims: ChunkDims) -> u32 {
        (self.x + self.y * dims.width + self.z * dims.width * dims.height) as u32
    }

    /// Inverse of [`LocalPos::pack`]. Returns `None` if the key lies
    /// outside the chunk extents.
    #[must_use]
    pub fn unpack(key: u32, dims: ChunkDims) -> Option<Self> {
        let key = key as usize;
        let slab = dims.width * dims.height;
        let z = key / slab;
        let y = (key % slab) / dims.width;
        let x = key % dims.width;
        let pos = Self { x, y, z };
        dims.contains(pos.x, pos.y, pos.z).then_some(pos)
    }
}

/// One cell of the block arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    /// What occupies the cell.
    pub kind: BlockKind,
    /// Slot in this kind's visible-instance list, if the block is visible.
    pub instance: Option<usize>,
}

impl Block {
    const EMPTY: Self = Self {
        kind: BlockKind::Empty,
        instance: None,
    };
}

/// A generated chunk: dense block arena plus per-kind visible-instance
/// lists (indexed by block kind id).
#[derive(Clone, Debug)]
pub struct Chunk {
    coord: ChunkCoord,
    dims: ChunkDims,
    blocks: Vec<Block>,
    instances: Vec<Vec<LocalPos>>,
}

impl Chunk {
    /// Runs the full generation pipeline for one chunk coordinate.
    ///
    /// Stages run in a fixed order over one seeded stream, then recorded
    /// edits for this chunk are replayed, then the visibility pass builds
    /// the instance list. The result is fully populated; partially
    /// generated chunks are never observable.
    #[must_use]
    pub fn generate(coord: ChunkCoord, params: &GenerationParams, edits: &EditStore) -> Self {
        let mut chunk = Self {
            coord,
            dims: params.dims,
            blocks: vec![Block::EMPTY; params.dims.volume()],
            instances: vec![Vec::new(); BlockKind::ALL.len()],
        };

        // Field construction order is part of the deterministic output.
        // All fields come off the stream before the tree stage draws its
        // chunk-dependent number of values, so every field is a function
        // of the seed alone.
        let mut rng = SeededRng::new(params.seed);
        let resource_field = NoiseField::new(&mut rng);
        let terrain_field = NoiseField::new(&mut rng);
        let tree_field = NoiseField::new(&mut rng);
        let cloud_field = NoiseField::new(&mut rng);

        chunk.generate_resources(params, &resource_field);
        chunk.generate_terrain(params, &terrain_field);
        chunk.generate_trees(params, &tree_field, &mut rng);
        chunk.generate_clouds(params, &cloud_field);
        chunk.apply_edits(edits);
        chunk.build_instances();

        debug!(
            chunk_x = coord.x,
            chunk_z = coord.z,
            instances = chunk.instance_count(),
            "generated chunk"
        );
        chunk
    }

    /// Seeds the volume with resource blocks wherever 3D noise clears the
    /// per-resource scarcity threshold. Later stages carve this down.
    fn generate_resources(&mut self, params: &GenerationParams, field: &NoiseField) {
        let (ox, oz) = self.coord.origin(self.dims.width);
        for res in &params.resources {
            for x in 0..self.dims.width {
                for y in 0..self.dims.height {
                    for z in 0..self.dims.width {
                        let value = field.noise3(
                            f64::from(ox + x as i32) / res.scale[0],
                            y as f64 / res.scale[1],
                            f64::from(oz + z as i32) / res.scale[2],
                        );
                        if value > res.scarcity {
                            self.set_kind(LocalPos::new(x, y, z), res.kind);
                        }
                    }
                }
            }
        }
    }

    /// Shapes the surface from a 2D height field.
    ///
    /// Below the surface, resource blocks survive and the rest becomes
    /// dirt. At the surface, grass, or sand at and below the water line.
    /// Above the surface, everything is cleared.
    fn generate_terrain(&mut self, params: &GenerationParams, field: &NoiseField) {
        let (ox, oz) = self.coord.origin(self.dims.width);
        for x in 0..self.dims.width {
            for z in 0..self.dims.width {
                let value = field.noise2(
                    f64::from(ox + x as i32) / params.terrain.scale,
                    f64::from(oz + z as i32) / params.terrain.scale,
                );
                let scaled = params.terrain.offset + params.terrain.magnitude * value;
                let height = ((self.dims.height as f64 * scaled).floor() as isize)
                    .clamp(0, self.dims.height as isize - 1) as usize;

                for y in 0..self.dims.height {
                    let pos = LocalPos::new(x, y, z);
                    if y <= params.terrain.water_height && y <= height {
                        self.set_kind(pos, BlockKind::Sand);
                    } else if y == height {
                        self.set_kind(pos, BlockKind::Grass);
                    } else if y < height && self.kind_at(pos) == BlockKind::Empty {
                        self.set_kind(pos, BlockKind::Dirt);
                    } else if y > height {
                        self.set_kind(pos, BlockKind::Empty);
                    }
                }
            }
        }
    }

    /// Plants trees on grass columns where the placement noise fires.
    ///
    /// Columns within a canopy radius of the chunk border are skipped so
    /// canopies never spill outside the chunk.
    fn generate_trees(&mut self, params: &GenerationParams, field: &NoiseField, rng: &mut SeededRng) {
        let margin = params.trees.canopy_radius.max;
        if margin * 2 >= self.dims.width {
            return;
        }
        let (ox, oz) = self.coord.origin(self.dims.width);

        for x in margin..self.dims.width - margin {
            for z in margin..self.dims.width - margin {
                let noise = field.noise2(f64::from(ox + x as i32), f64::from(oz + z as i32));
                if (noise + 1.0) / 2.0 >= params.trees.frequency {
                    continue;
                }

                // Trunk base sits on the first grass cell of the column.
                let Some(base) = (0..self.dims.height)
                    .find(|&y| self.kind_at(LocalPos::new(x, y, z)) == BlockKind::Grass)
                else {
                    continue;
                };

                let trunk = rng.next_range(params.trees.trunk_height.min, params.trees.trunk_height.max);
                let top = (base + trunk).min(self.dims.height - 1);
                for y in base + 1..=top {
                    self.set_kind(LocalPos::new(x, y, z), BlockKind::Trunk);
                }

                let radius = rng.next_range(params.trees.canopy_radius.min, params.trees.canopy_radius.max)
                    as isize;
                for dx in -radius..=radius {
                    for dy in -radius..=radius {
                        for dz in -radius..=radius {
                            if dx * dx + dy * dy + dz * dz > radius * radius {
                                continue;
                            }
                            let cx = x as isize + dx;
                            let cy = top as isize + dy;
                            let cz = z as isize + dz;
                            if !self.dims.contains_signed(cx, cy, cz) {
                                continue;
                            }
                            let pos = LocalPos::new(cx as usize, cy as usize, cz as usize);
                            if self.kind_at(pos) == BlockKind::Empty
                                && rng.random() < params.trees.canopy_density
                            {
                                self.set_kind(pos, BlockKind::Leaves);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Lays a cloud layer across the top slab of the chunk.
    fn generate_clouds(&mut self, params: &GenerationParams, field: &NoiseField) {
        let (ox, oz) = self.coord.origin(self.dims.width);
        let layer = self.dims.height - 1;
        for x in 0..self.dims.width {
            for z in 0..self.dims.width {
                let value = (field.noise2(
                    f64::from(ox + x as i32) / params.clouds.scale,
                    f64::from(oz + z as i32) / params.clouds.scale,
                ) + 1.0)
                    / 2.0;
                if value < params.clouds.density {
                    self.set_kind(LocalPos::new(x, layer, z), BlockKind::Cloud);
                }
            }
        }
    }

    /// Replays recorded overrides for this chunk on top of the generated
    /// volume. Runs last so edits always win.
    fn apply_edits(&mut self, edits: &EditStore) {
        if let Some(overrides) = edits.chunk_overrides(self.coord) {
            for (&pos, &kind) in overrides {
                if self.dims.contains(pos.x, pos.y, pos.z) {
                    self.set_kind(pos, kind);
                }
            }
        }
    }

    /// Builds the per-kind visible-instance lists from scratch.
    fn build_instances(&mut self) {
        for list in &mut self.instances {
            list.clear();
        }
        for x in 0..self.dims.width {
            for y in 0..self.dims.height {
                for z in 0..self.dims.width {
                    let pos = LocalPos::new(x, y, z);
                    let idx = self.dims.index(x, y, z);
                    let kind = self.blocks[idx].kind;
                    self.blocks[idx].instance = None;
                    if !kind.is_empty() && !self.is_occluded(pos) {
                        let list = &mut self.instances[kind.id() as usize];
                        self.blocks[idx].instance = Some(list.len());
                        list.push(pos);
                    }
                }
            }
        }
    }

    /// This chunk's grid coordinate.
    #[must_use]
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// This chunk's extents.
    #[must_use]
    pub fn dims(&self) -> ChunkDims {
        self.dims
    }

    /// The cell at a local position, or `None` out of bounds.
    #[must_use]
    pub fn block(&self, pos: LocalPos) -> Option<Block> {
        self.dims
            .contains(pos.x, pos.y, pos.z)
            .then(|| self.blocks[self.dims.index(pos.x, pos.y, pos.z)])
    }

    /// The block kind at a local position, or `None` out of bounds.
    #[must_use]
    pub fn kind(&self, pos: LocalPos) -> Option<BlockKind> {
        self.block(pos).map(|b| b.kind)
    }

    /// The visible-instance list for one block kind. Dense: every slot
    /// holds the position of exactly one visible block of that kind.
    #[must_use]
    pub fn visible_instances(&self, kind: BlockKind) -> &[LocalPos] {
        &self.instances[kind.id() as usize]
    }

    /// Number of visible blocks across all kinds.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances.iter().map(Vec::len).sum()
    }

    /// True when all six face neighbors inside the chunk are non-empty.
    /// Cells on the chunk boundary are never occluded.
    #[must_use]
    pub fn is_occluded(&self, pos: LocalPos) -> bool {
        NEIGHBOR_OFFSETS.iter().all(|&(dx, dy, dz)| {
            let nx = pos.x as isize + dx;
            let ny = pos.y as isize + dy;
            let nz = pos.z as isize + dz;
            self.dims.contains_signed(nx, ny, nz)
                && !self.blocks[self.dims.index(nx as usize, ny as usize, nz as usize)]
                    .kind
                    .is_empty()
        })
    }

    /// Places a block into an empty cell and updates visibility around it.
    ///
    /// Returns false (and changes nothing) if the position is out of
    /// bounds or the cell is already occupied, or if `kind` is empty.
    pub fn add_block(&mut self, pos: LocalPos, kind: BlockKind) -> bool {
        if kind.is_empty() || !self.dims.contains(pos.x, pos.y, pos.z) {
            return false;
        }
        let idx = self.dims.index(pos.x, pos.y, pos.z);
        if !self.blocks[idx].kind.is_empty() {
            return false;
        }
        self.blocks[idx].kind = kind;
        self.add_instance(pos);
        self.refresh_neighbors(pos);
        true
    }

    /// Clears an occupied cell and updates visibility around it.
    ///
    /// Returns the removed kind, or `None` (changing nothing) if the
    /// position is out of bounds or already empty.
    pub fn remove_block(&mut self, pos: LocalPos) -> Option<BlockKind> {
        if !self.dims.contains(pos.x, pos.y, pos.z) {
            return None;
        }
        let idx = self.dims.index(pos.x, pos.y, pos.z);
        let kind = self.blocks[idx].kind;
        if kind.is_empty() {
            return None;
        }
        self.delete_instance(pos);
        self.blocks[idx].kind = BlockKind::Empty;
        self.refresh_neighbors(pos);
        Some(kind)
    }

    /// Overwrites a cell's kind without touching instance bookkeeping.
    fn set_kind(&mut self, pos: LocalPos, kind: BlockKind) {
        let idx = self.dims.index(pos.x, pos.y, pos.z);
        self.blocks[idx].kind = kind;
    }

    /// In-bounds kind read for the pipeline's hot loops.
    fn kind_at(&self, pos: LocalPos) -> BlockKind {
        self.blocks[self.dims.index(pos.x, pos.y, pos.z)].kind
    }

    /// Gives a visible block a slot in its kind's list if it lacks one.
    fn add_instance(&mut self, pos: LocalPos) {
        let idx = self.dims.index(pos.x, pos.y, pos.z);
        let kind = self.blocks[idx].kind;
        if kind.is_empty() || self.blocks[idx].instance.is_some() || self.is_occluded(pos) {
            return;
        }
        let list = &mut self.instances[kind.id() as usize];
        self.blocks[idx].instance = Some(list.len());
        list.push(pos);
    }

    /// Releases a block's instance slot, keeping its kind's list dense by
    /// moving the tail slot into the gap and re-pointing the moved block.
    fn delete_instance(&mut self, pos: LocalPos) {
        let idx = self.dims.index(pos.x, pos.y, pos.z);
        let kind_idx = self.blocks[idx].kind.id() as usize;
        let Some(slot) = self.blocks[idx].instance.take() else {
            return;
        };
        let last = self.instances[kind_idx].len() - 1;
        if slot != last {
            let moved = self.instances[kind_idx][last];
            self.instances[kind_idx][slot] = moved;
            let moved_idx = self.dims.index(moved.x, moved.y, moved.z);
            self.blocks[moved_idx].instance = Some(slot);
        }
        self.instances[kind_idx].pop();
    }

    /// Reconciles the six neighbors of a just-mutated cell: newly occluded
    /// neighbors lose their slot, newly exposed ones gain one.
    fn refresh_neighbors(&mut self, pos: LocalPos) {
        for &(dx, dy, dz) in &NEIGHBOR_OFFSETS {
            let nx = pos.x as isize + dx;
            let ny = pos.y as isize + dy;
            let nz = pos.z as isize + dz;
            if !self.dims.contains_signed(nx, ny, nz) {
                continue;
            }
            let npos = LocalPos::new(nx as usize, ny as usize, nz as usize);
            if self.is_occluded(npos) {
                self.delete_instance(npos);
            } else {
                self.add_instance(npos);
            }
        }
    }
}
