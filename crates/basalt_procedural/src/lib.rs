//! # Basalt Procedural
//!
//! Deterministic voxel world core: seeded noise, chunk generation,
//! draw-distance streaming, and an edit overlay that makes player
//! modifications durable across chunk unloads and saves.
//!
//! ## Architecture
//!
//! ```text
//! SeededRng -> NoiseField -> Chunk::generate -> World streaming window
//!                                 ^                    |
//!                                 +---- EditStore <----+
//! ```
//!
//! The [`World`] owns everything: resident [`Chunk`]s, the generation
//! queue, and the [`EditStore`]. A chunk is a pure function of
//! `(coordinate, params, edits)`, so nothing but parameters and edits ever
//! needs persisting.
//!
//! ## Quick start
//!
//! ```
//! use basalt_procedural::{GenerationParams, World};
//!
//! let mut params = GenerationParams::default();
//! params.seed = 20_260_830;
//! let mut world = World::new(params)?;
//!
//! world.ensure_loaded_around(0, 0);
//! if let Some(kind) = world.get_block(4, 12, 4) {
//!     println!("block at (4, 12, 4): {kind:?}");
//! }
//! # Ok::<(), basalt_procedural::WorldError>(())
//! ```

pub mod chunk;
pub mod edits;
pub mod error;
pub mod noise;
pub mod params;
pub mod rng;
pub mod world;

pub use chunk::{Block, Chunk, ChunkCoord, LocalPos};
pub use edits::EditStore;
pub use error::{WorldError, WorldResult};
pub use noise::NoiseField;
pub use params::{
    ChunkDims, CloudParams, GenerationParams, RangeParam, ResourceParams, TerrainParams, TreeParams,
};
pub use rng::SeededRng;
pub use world::{ChunkState, World, WorldSave, WorldStats, DEFAULT_DRAW_DISTANCE};
